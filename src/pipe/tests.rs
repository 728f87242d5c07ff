use super::*;
use crate::graph::Graph;
use crate::model::{Direction, ElementId, PropertyMap, VertexIdx};

fn source<'g>(names: &[&str]) -> Starts<'g> {
    Starts::Source(
        names
            .iter()
            .map(|n| Element::Id(ElementId::from(*n)))
            .collect(),
    )
}

fn drain(pipe: &mut Pipe<'_>) -> Vec<Element> {
    let mut out = Vec::new();
    while pipe.has_next().unwrap() {
        out.push(pipe.next().unwrap().unwrap());
    }
    out
}

#[test]
fn has_next_buffers_exactly_one_element() {
    let mut pipe = Pipe::new(IdentityStep);
    pipe.set_starts(source(&["a", "b"]));
    assert_eq!(pipe.look_ahead(), &LookAhead::Empty);
    assert!(pipe.has_next().unwrap());
    assert!(pipe.has_next().unwrap());
    assert_eq!(pipe.look_ahead(), &LookAhead::Buffered(Element::Id("a".into())));
    assert_eq!(pipe.next().unwrap(), Some(Element::Id("a".into())));
    assert_eq!(pipe.look_ahead(), &LookAhead::Empty);
    assert_eq!(pipe.next().unwrap(), Some(Element::Id("b".into())));
    assert!(!pipe.has_next().unwrap());
    assert_eq!(pipe.look_ahead(), &LookAhead::Exhausted);
    assert_eq!(pipe.next().unwrap(), None);
}

#[test]
fn next_without_has_next_pulls_directly() {
    let mut pipe = Pipe::new(IdentityStep);
    pipe.set_starts(source(&["a"]));
    assert_eq!(pipe.next().unwrap(), Some(Element::Id("a".into())));
    assert_eq!(pipe.next().unwrap(), None);
}

#[test]
fn unbound_pipe_fails_fast() {
    let mut pipe = Pipe::new(IdentityStep);
    assert!(matches!(pipe.has_next(), Err(GraphError::InvalidState(_))));
}

#[test]
fn source_boundary_is_exact() {
    let mut src: ElementSource = [Element::Id("only".into())].into_iter().collect();
    assert!(src.has_next());
    assert!(src.next_element().is_some());
    assert!(!src.has_next());
    assert!(src.next_element().is_none());
    assert!(src.next_element().is_none());
}

#[test]
fn limit_stops_even_when_upstream_has_more() {
    let mut pipe = Pipe::new(LimitStep::new(2));
    pipe.set_starts(source(&["a", "b", "c"]));
    assert_eq!(drain(&mut pipe).len(), 2);
    assert_eq!(pipe.next().unwrap(), None);
}

#[test]
fn distinct_and_reset() {
    let mut inner = Pipe::new(IdentityStep);
    inner.set_starts(source(&["a", "b", "a", "c", "b"]));
    let mut pipe = Pipe::new(DistinctStep::new());
    pipe.set_starts(Starts::Pipe(Box::new(inner)));
    let first = drain(&mut pipe);
    assert_eq!(
        first,
        vec![
            Element::Id("a".into()),
            Element::Id("b".into()),
            Element::Id("c".into())
        ]
    );
    pipe.reset();
    assert_eq!(drain(&mut pipe), first);
}

#[test]
fn adjacent_vertices_flatten_before_advancing() {
    let mut graph = Graph::new();
    let hub = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let lone = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let leaves: Vec<VertexIdx> = (0..3)
        .map(|_| graph.add_vertex("n", PropertyMap::new(), None).unwrap())
        .collect();
    for leaf in &leaves {
        graph.add_edge("e", hub, *leaf, PropertyMap::new()).unwrap();
    }
    graph.add_edge("e", lone, hub, PropertyMap::new()).unwrap();

    let mut pipe = Pipe::new(AdjacentVerticesStep::new(&graph, Direction::Out, vec![]));
    pipe.set_starts(Starts::Source(ElementSource::new(vec![
        Element::Vertex(hub),
        Element::Vertex(leaves[0]),
        Element::Vertex(lone),
    ])));
    let out: Vec<_> = drain(&mut pipe)
        .into_iter()
        .filter_map(|e| e.as_vertex())
        .collect();
    assert_eq!(out, vec![leaves[0], leaves[1], leaves[2], hub]);
}

#[test]
fn side_effect_passes_elements_through() {
    let mut count = 0;
    {
        let mut pipe = Pipe::new(SideEffectStep::new(|_| count += 1));
        pipe.set_starts(source(&["x", "y"]));
        assert_eq!(drain(&mut pipe).len(), 2);
    }
    assert_eq!(count, 2);
}

#[test]
fn id_step_rejects_anonymous_maps() {
    let graph = Graph::new();
    let mut pipe = Pipe::new(IdStep::new(&graph));
    pipe.set_starts(Starts::Source(ElementSource::new(vec![Element::Properties(
        PropertyMap::new(),
    )])));
    assert!(matches!(pipe.next(), Err(GraphError::InvalidState(_))));
}
