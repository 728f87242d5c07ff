use super::*;

fn props(pairs: &[(&str, PropertyValue)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

#[test]
fn sequential_ids_skip_taken_integers() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    graph
        .add_vertex("n", PropertyMap::new(), Some(ElementId::Int(2)))
        .unwrap();
    let c = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    assert_eq!(graph.vertex(a).id, ElementId::Int(1));
    assert_eq!(graph.vertex(c).id, ElementId::Int(3));
}

#[test]
fn duplicate_id_is_rejected() {
    let mut graph = Graph::new();
    graph
        .add_vertex("profile", PropertyMap::new(), Some("p-1".into()))
        .unwrap();
    let err = graph
        .add_vertex("profile", PropertyMap::new(), Some("p-1".into()))
        .unwrap_err();
    assert!(matches!(err, GraphError::DuplicateId(id) if id == ElementId::from("p-1")));
    assert_eq!(graph.vertex_count(), 1);
}

#[test]
fn get_vertex_reports_missing_ids() {
    let graph = Graph::new();
    let err = graph.get_vertex(&"nope".into()).unwrap_err();
    assert!(matches!(err, GraphError::NotFound(_)));
}

#[test]
fn add_edge_registers_both_endpoints_in_order() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let b = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let c = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let e1 = graph.add_edge("knows", a, b, PropertyMap::new()).unwrap();
    let e2 = graph.add_edge("likes", a, c, PropertyMap::new()).unwrap();
    let e3 = graph.add_edge("knows", a, b, PropertyMap::new()).unwrap();

    assert_eq!(graph.vertex(a).out_edges().get("knows"), &[e1, e3]);
    assert_eq!(graph.vertex(b).in_edges().get("knows"), &[e1, e3]);
    assert_eq!(graph.vertex(c).in_edges().get("likes"), &[e2]);
    assert_eq!(graph.edge(e2).out_vertex, a);
    assert_eq!(graph.edge(e2).in_vertex, c);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn get_edges_follows_label_argument_order() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let b = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let x = graph.add_edge("x", a, b, PropertyMap::new()).unwrap();
    let y = graph.add_edge("y", a, b, PropertyMap::new()).unwrap();
    let back = graph.add_edge("x", b, a, PropertyMap::new()).unwrap();

    assert_eq!(graph.get_edges(a, Direction::Out, &["y", "x"]), vec![y, x]);
    assert_eq!(graph.get_edges::<&str>(a, Direction::Out, &[]), vec![x, y]);
    assert_eq!(graph.get_edges(a, Direction::In, &["x"]), vec![back]);
    assert_eq!(graph.get_edges::<&str>(a, Direction::Both, &[]), vec![x, y, back]);
    assert!(graph.get_edges(a, Direction::Out, &["missing"]).is_empty());
}

#[test]
fn add_edge_rejects_foreign_indices() {
    let mut graph = Graph::new();
    let a = graph.add_vertex("n", PropertyMap::new(), None).unwrap();
    let err = graph
        .add_edge("x", a, VertexIdx(7), PropertyMap::new())
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
    assert!(graph.vertex(a).out_edges().is_empty());
}

#[test]
fn stats_count_labels() {
    let mut graph = Graph::new();
    let p = graph
        .add_vertex("profile", props(&[("username", "bob".into())]), Some("p-1".into()))
        .unwrap();
    let l = graph
        .add_vertex("listing", PropertyMap::new(), Some("l-1".into()))
        .unwrap();
    graph.add_edge("bookmarked", p, l, PropertyMap::new()).unwrap();

    let stats = graph.stats();
    assert_eq!(stats.vertices, 2);
    assert_eq!(stats.edges, 1);
    assert_eq!(stats.vertex_labels["profile"], 1);
    assert_eq!(stats.edge_labels["bookmarked"], 1);
    assert_eq!(graph.vertices_with_label("listing").collect::<Vec<_>>(), vec![l]);
}

#[test]
fn id_of_reads_internal_id_from_projected_maps() {
    let graph = Graph::new();
    let map = props(&[("_id", "p-9".into())]);
    assert_eq!(
        graph.id_of(&Element::Properties(map)),
        Some(ElementId::from("p-9"))
    );
    assert_eq!(graph.id_of(&Element::Properties(PropertyMap::new())), None);
}

#[test]
fn id_of_prefers_registered_names_over_numeric_strings() {
    let mut graph = Graph::new();
    let wide = u64::MAX.to_string();
    let map = props(&[("_id", wide.as_str().into())]);
    assert_eq!(
        graph.id_of(&Element::Properties(map.clone())),
        Some(ElementId::Int(u64::MAX))
    );

    graph
        .add_vertex("n", PropertyMap::new(), Some(ElementId::from(wide.as_str())))
        .unwrap();
    assert_eq!(
        graph.id_of(&Element::Properties(map)),
        Some(ElementId::from(wide.as_str()))
    );
}
