use std::cell::RefCell;

use super::*;
use crate::model::PropertyMap;

fn ids(list: &[&str]) -> Vec<ElementId> {
    list.iter().map(|s| ElementId::from(*s)).collect()
}

fn bookmark_graph() -> Graph {
    let mut graph = Graph::new();
    for p in ["p-1", "p-2", "p-3", "p-4", "p-5"] {
        let mut props = PropertyMap::new();
        props.insert("username".into(), p.replace("p-", "user").into());
        graph.add_vertex("profile", props, Some(p.into())).unwrap();
    }
    for l in ["l-1", "l-2", "l-3"] {
        graph.add_vertex("listing", PropertyMap::new(), Some(l.into())).unwrap();
    }
    for (p, l) in [
        ("p-1", "l-1"),
        ("p-2", "l-1"),
        ("p-3", "l-1"),
        ("p-3", "l-2"),
        ("p-1", "l-2"),
        ("p-4", "l-3"),
        ("p-5", "l-3"),
        ("p-1", "l-3"),
        ("p-5", "l-3"),
    ] {
        graph
            .add_edge_between("bookmarked", &p.into(), &l.into(), PropertyMap::new())
            .unwrap();
    }
    graph
}

#[test]
fn v_id_round_trips() {
    let graph = bookmark_graph();
    assert_eq!(graph.query().v(["p-3"]).to_id_list().unwrap(), ids(&["p-3"]));
}

#[test]
fn v_unknown_id_is_not_found() {
    let graph = bookmark_graph();
    let err = graph.query().v(["p-1", "p-404"]).id().to_list().unwrap_err();
    assert!(matches!(err, GraphError::NotFound(id) if id == ElementId::from("p-404")));
}

#[test]
fn out_follows_insertion_order() {
    let graph = bookmark_graph();
    let listings = graph.query().v(["p-1"]).out("bookmarked").to_id_list().unwrap();
    assert_eq!(listings, ids(&["l-1", "l-2", "l-3"]));
}

#[test]
fn two_hop_preserves_multiplicity() {
    let graph = bookmark_graph();
    let profiles = graph
        .query()
        .v(["p-1"])
        .out("bookmarked")
        .in_("bookmarked")
        .to_id_list()
        .unwrap();
    assert_eq!(
        profiles,
        ids(&["p-1", "p-2", "p-3", "p-3", "p-1", "p-4", "p-5", "p-1", "p-5"])
    );
}

#[test]
fn two_hop_distinct_keeps_first_seen_order() {
    let graph = bookmark_graph();
    let profiles = graph
        .query()
        .v(["p-1"])
        .out("bookmarked")
        .in_("bookmarked")
        .distinct()
        .to_id_list()
        .unwrap();
    assert_eq!(profiles, ids(&["p-1", "p-2", "p-3", "p-4", "p-5"]));
}

#[test]
fn exclude_ids_removes_self() {
    let graph = bookmark_graph();
    let profiles = graph
        .query()
        .v(["p-1"])
        .out("bookmarked")
        .in_("bookmarked")
        .distinct()
        .exclude_ids(["p-1"])
        .to_id_list()
        .unwrap();
    assert_eq!(profiles, ids(&["p-2", "p-3", "p-4", "p-5"]));
}

#[test]
fn exclude_ids_after_id_projection_filters_ids() {
    let graph = bookmark_graph();
    let listings = graph
        .query()
        .v(["p-3"])
        .out("bookmarked")
        .id()
        .exclude_ids(["l-1"])
        .to_list()
        .unwrap();
    assert_eq!(listings, vec![Element::Id("l-2".into())]);
}

#[test]
fn limit_returns_prefix() {
    let graph = bookmark_graph();
    let all = graph.query().vertices().to_id_list().unwrap();
    let limited = graph.query().vertices().limit(3).to_id_list().unwrap();
    assert_eq!(limited, all[..3].to_vec());
    let twice = graph.query().vertices().limit(3).limit(3).to_id_list().unwrap();
    assert_eq!(twice, limited);
    assert_eq!(graph.query().vertices().limit(100).count().unwrap(), 8);
}

#[test]
fn to_dict_is_stable_across_queries() {
    let graph = bookmark_graph();
    let first = graph.query().vertices().to_dict().to_list().unwrap();
    let second = graph.query().vertices().to_dict().to_list().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);
    let Element::Properties(map) = &first[0] else {
        panic!("expected property map");
    };
    assert_eq!(map.get("username"), Some(&PropertyValue::from("user1")));
    assert!(!map.contains_key("_id"));
}

#[test]
fn internal_properties_carry_id_and_label() {
    let graph = bookmark_graph();
    let maps = graph.query().v(["l-2"]).properties(true).to_list().unwrap();
    let Element::Properties(map) = &maps[0] else {
        panic!("expected property map");
    };
    assert_eq!(map.get("_id"), Some(&PropertyValue::from("l-2")));
    assert_eq!(map.get("_label"), Some(&PropertyValue::from("listing")));
    // the graph itself is untouched
    let idx = graph.get_vertex(&"l-2".into()).unwrap();
    assert!(graph.vertex(idx).properties.is_empty());
}

#[test]
fn side_effect_sees_every_element_in_order() {
    let graph = bookmark_graph();
    let seen = RefCell::new(Vec::new());
    let out = graph
        .query()
        .v(["p-1"])
        .out("bookmarked")
        .id()
        .side_effect(|e| seen.borrow_mut().push(e.clone()))
        .to_list()
        .unwrap();
    assert_eq!(out, seen.into_inner());
}

#[test]
fn edge_steps_round_trip_to_vertices() {
    let graph = bookmark_graph();
    let via_edges = graph
        .query()
        .v(["p-3"])
        .out_e("bookmarked")
        .in_v()
        .to_id_list()
        .unwrap();
    assert_eq!(via_edges, ids(&["l-1", "l-2"]));
    let back = graph
        .query()
        .v(["l-2"])
        .in_e("bookmarked")
        .out_v()
        .to_id_list()
        .unwrap();
    assert_eq!(back, ids(&["p-3", "p-1"]));
}

#[test]
fn both_visits_out_then_in() {
    let mut graph = bookmark_graph();
    graph
        .add_edge_between("follows", &"l-1".into(), &"p-2".into(), PropertyMap::new())
        .unwrap();
    let around = graph.query().v(["l-1"]).both(Labels::any()).to_id_list().unwrap();
    assert_eq!(around, ids(&["p-2", "p-1", "p-2", "p-3"]));
}

#[test]
fn has_and_has_label_filter() {
    let graph = bookmark_graph();
    let found = graph
        .query()
        .vertices()
        .has_label("profile")
        .has("username", "user4")
        .to_id_list()
        .unwrap();
    assert_eq!(found, ids(&["p-4"]));
}

#[test]
fn steps_before_start_are_invalid() {
    let graph = bookmark_graph();
    let err = graph.query().out("bookmarked").to_list().unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
    let err = graph.query().vertices().v(["p-1"]).count().unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[test]
fn out_on_projected_ids_is_invalid() {
    let graph = bookmark_graph();
    let err = graph
        .query()
        .v(["p-1"])
        .id()
        .out("bookmarked")
        .to_list()
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidState(_)));
}

#[test]
fn into_pipeline_streams_lazily() {
    let graph = bookmark_graph();
    let pulled = RefCell::new(0usize);
    let mut pipeline = graph
        .query()
        .vertices()
        .side_effect(|_| *pulled.borrow_mut() += 1)
        .limit(2)
        .into_pipeline()
        .unwrap();
    assert_eq!(*pulled.borrow(), 0);
    assert!(pipeline.has_next().unwrap());
    assert_eq!(*pulled.borrow(), 1);
    assert!(pipeline.next().unwrap().is_some());
    assert!(pipeline.next().unwrap().is_some());
    assert!(pipeline.next().unwrap().is_none());
    assert_eq!(*pulled.borrow(), 2);
}

#[test]
fn internal_id_survives_ids_beyond_i64() {
    let mut graph = Graph::new();
    graph
        .add_vertex("n", PropertyMap::new(), Some(ElementId::Int(u64::MAX)))
        .unwrap();
    graph.add_vertex("n", PropertyMap::new(), Some(ElementId::Int(7))).unwrap();

    let maps = graph.query().vertices().properties(true).to_list().unwrap();
    assert_eq!(graph.id_of(&maps[0]), Some(ElementId::Int(u64::MAX)));

    let kept = graph
        .query()
        .vertices()
        .properties(true)
        .exclude_ids([ElementId::Int(u64::MAX)])
        .to_list()
        .unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(graph.id_of(&kept[0]), Some(ElementId::Int(7)));
}
