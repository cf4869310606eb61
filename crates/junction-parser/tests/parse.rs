use pretty_assertions::assert_eq;

use junction_core::{
    Diagram, EdgeType, NodeType,
    diagram::DIRECTION_KEY,
    format::{Format, SourceFormat},
};
use junction_parser::{ErrorCode, parse, text::TextOptions};

fn parse_as(source: &str, format: Format) -> Diagram {
    parse(source, format.into(), &TextOptions::default()).expect("Failed to parse")
}

fn summary(diagram: &Diagram) -> (Vec<(String, String, NodeType)>, Vec<(String, String, Option<String>, EdgeType)>) {
    let nodes = diagram
        .nodes()
        .map(|n| (n.id().to_string(), n.label().to_string(), n.node_type()))
        .collect();
    let edges = diagram
        .edges()
        .iter()
        .map(|e| {
            (
                e.source().to_string(),
                e.target().to_string(),
                e.label().map(str::to_string),
                e.edge_type(),
            )
        })
        .collect();
    (nodes, edges)
}

#[test]
fn test_same_flow_in_every_format() {
    let mermaid = r#"
---
title: Order flow
---
flowchart LR
    start([Start])
    check{Valid?}
    ship[[Ship order]]
    start --> check
    check ==>|yes| ship
    check -.->|retry| start
"#;
    let plantuml = r#"
@startuml
title Order flow
left to right direction
usecase "Start" as start <<start>>
hexagon "Valid?" as check
component "Ship order" as ship
start --> check
check -[bold]-> ship : yes
check ..> start : retry
@enduml
"#;
    let d2 = r#"
direction: right
title: "Order flow" {near: top-center; shape: text}
start: "Start" {shape: oval}
check: "Valid?" {shape: diamond}
ship: "Ship order" {shape: package}
start -> check
check -> ship: "yes" {style.bold: true}
check -> start: "retry" {style.stroke-dash: 3}
"#;
    let dot = r#"
digraph G {
    label="Order flow";
    rankdir=LR;
    start [label="Start", shape=ellipse];
    check [label="Valid?", shape=diamond];
    ship [label="Ship order", shape=box3d];
    start -> check;
    check -> ship [label="yes", style=bold];
    check -> start [label="retry", style=dashed];
}
"#;

    let expected = summary(&parse_as(mermaid, Format::Mermaid));
    assert_eq!(expected.0.len(), 3);
    assert_eq!(expected.1.len(), 3);

    for (source, format) in [
        (plantuml, Format::PlantUml),
        (d2, Format::D2),
        (dot, Format::Dot),
    ] {
        let diagram = parse_as(source, format);
        assert_eq!(summary(&diagram), expected, "{format} differs");
        assert_eq!(diagram.title(), Some("Order flow"), "{format} title");
        assert_eq!(diagram.metadata(DIRECTION_KEY), Some("LR"), "{format} direction");
    }
}

#[test]
fn test_text_example() {
    let diagram = parse(
        "Start -> Process data -> Make decision -> End",
        SourceFormat::Text,
        &TextOptions::default(),
    )
    .expect("Failed to parse");

    let types: Vec<_> = diagram.nodes().map(|n| n.node_type()).collect();
    assert_eq!(
        types,
        vec![NodeType::Start, NodeType::Process, NodeType::Process, NodeType::End]
    );
    let pairs: Vec<_> = diagram
        .edges()
        .iter()
        .map(|e| (e.source(), e.target()))
        .collect();
    assert_eq!(pairs, vec![("n0", "n1"), ("n1", "n2"), ("n2", "n3")]);
}

#[test]
fn test_text_branch_example() {
    let diagram = parse(
        "Receive order\n-> Payment ok?\n-> [yes] Ship\n-> [no] Cancel\n=> Notify customer",
        SourceFormat::Text,
        &TextOptions::default(),
    )
    .expect("Failed to parse");

    let branches: Vec<_> = diagram
        .edges()
        .iter()
        .filter(|e| e.edge_type() == EdgeType::Conditional)
        .collect();
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].source(), branches[1].source());
    assert_eq!(branches[0].label(), Some("yes"));
    assert_eq!(branches[1].label(), Some("no"));
    assert_eq!(
        diagram.node(branches[0].source()).unwrap().node_type(),
        NodeType::Decision
    );

    let merge = diagram.node("n4").unwrap();
    assert_eq!(merge.label(), "Notify customer");
    let into_merge: Vec<_> = diagram
        .edges()
        .iter()
        .filter(|e| e.target() == merge.id())
        .map(|e| e.source())
        .collect();
    assert_eq!(into_merge, vec!["n2", "n3"]);
}

#[test]
fn test_errors_report_every_problem_with_lines() {
    let source = "flowchart TD\na[A]\na --> b\nc --> a\n";
    let err = parse(source, Format::Mermaid.into(), &TextOptions::default()).unwrap_err();

    let found: Vec<_> = err
        .diagnostics()
        .iter()
        .map(|d| (d.code(), d.line()))
        .collect();
    assert_eq!(
        found,
        vec![(Some(ErrorCode::E200), Some(3)), (Some(ErrorCode::E200), Some(4))]
    );
    assert!(err.to_string().contains("(line 3)"));
}

#[test]
fn test_no_partial_diagrams() {
    let cases = [
        ("@startuml\nrectangle a\n", Format::PlantUml),
        ("a: {shape: oval", Format::D2),
        ("digraph { a -> b", Format::Dot),
        ("a --> b", Format::Mermaid),
    ];
    for (source, format) in cases {
        assert!(
            parse(source, format.into(), &TextOptions::default()).is_err(),
            "{format} accepted {source:?}"
        );
    }
}
