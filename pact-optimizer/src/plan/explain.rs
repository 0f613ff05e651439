use crate::plan::{OptimizedPlan, PhysicalChannel, PhysicalPlanNode, Plan, PlanNode};
use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};
use std::borrow::Cow;
use std::default::Default;
use std::io::{BufWriter, Write};

impl<'a> TreeItem for &'a PlanNode {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}: {}", self.name(), style.paint(self.operator()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.inputs()
                .iter()
                .map(|c| &**c)
                .collect::<Vec<&'a PlanNode>>(),
        )
    }
}

/// A node of an optimized plan, with the channel through which its consumer reads it.
#[derive(Clone)]
struct PhysicalTreeItem<'a> {
    plan: &'a OptimizedPlan,
    node: &'a PhysicalPlanNode,
    channel: Option<&'a PhysicalChannel>,
}

impl<'a> TreeItem for PhysicalTreeItem<'a> {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        if let Some(channel) = self.channel {
            write!(
                f,
                "[{} {}] ",
                channel.ship_strategy(),
                channel.local_strategy()
            )?;
        }
        write!(
            f,
            "{}: {} p={}",
            self.node.name(),
            style.paint(self.node.descriptor()),
            self.node.parallelism()
        )
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.node
                .inputs()
                .iter()
                .filter_map(|channel| {
                    self.plan.node(channel.source()).map(|node| PhysicalTreeItem {
                        plan: self.plan,
                        node,
                        channel: Some(channel),
                    })
                })
                .collect::<Vec<_>>(),
        )
    }
}

fn print_config() -> PrintConfig {
    PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    }
}

/// Writes one tree per sink. Nodes shared by several consumers are repeated.
pub fn explain<W: Write>(plan: &Plan, output: &mut W) -> std::io::Result<()> {
    let config = print_config();
    for sink in plan.sinks() {
        write_tree_with(&&**sink, &mut *output, &config)?;
    }
    Ok(())
}

pub fn explain_to_string(plan: &Plan) -> std::io::Result<String> {
    write_to_string(|buf| explain(plan, buf))
}

/// Writes one tree per sink, each node annotated with its strategy and its input channels.
pub fn explain_physical<W: Write>(plan: &OptimizedPlan, output: &mut W) -> std::io::Result<()> {
    let config = print_config();
    for sink in plan.sinks().iter().filter_map(|id| plan.node(*id)) {
        let item = PhysicalTreeItem {
            plan,
            node: sink,
            channel: None,
        };
        write_tree_with(&item, &mut *output, &config)?;
    }
    Ok(())
}

pub fn explain_physical_to_string(plan: &OptimizedPlan) -> std::io::Result<String> {
    write_to_string(|buf| explain_physical(plan, buf))
}

fn write_to_string<F>(write: F) -> std::io::Result<String>
where
    F: FnOnce(&mut BufWriter<Vec<u8>>) -> std::io::Result<()>,
{
    let mut buf = BufWriter::new(Vec::new());
    write(&mut buf)?;

    let bytes = buf.into_inner()?;
    String::from_utf8(bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use crate::operator::{Cross, DataSource, Map};
    use crate::plan::explain::explain_to_string;
    use crate::plan::{LogicalPlanBuilder, Plan};

    #[test]
    fn test_explain_logical_plan() {
        let sink = LogicalPlanBuilder::new()
            .source("src", DataSource::new())
            .map("map", Map::new().with_preserved_fields([0]))
            .sink("sink")
            .build()
            .unwrap();
        let mut plan = Plan::new("job");
        plan.add_sink(sink);

        let expected_result = "\
sink: Sink
└─ map: Map { preserved: {0} }
   └─ src: Source { records: Unknown, bytes: Unknown }
";

        let result = explain_to_string(&plan).unwrap();

        assert_eq!(expected_result, result);
    }

    #[test]
    fn test_explain_shared_input() {
        let mut builder = LogicalPlanBuilder::new();
        let source = builder.source("src", DataSource::new()).build().unwrap();
        let sink = builder
            .start_from(source.clone())
            .cross("cross", Cross::new(), source)
            .sink("sink")
            .build()
            .unwrap();
        let mut plan = Plan::new("job");
        plan.add_sink(sink);

        let expected_result = "\
sink: Sink
└─ cross: Cross
   ├─ src: Source { records: Unknown, bytes: Unknown }
   └─ src: Source { records: Unknown, bytes: Unknown }
";
        let result = explain_to_string(&plan).unwrap();
        assert_eq!(expected_result, result);
    }
}
