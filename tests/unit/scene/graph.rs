use super::*;
use crate::scene::node::ShapeData;
use crate::scene::shape::Geometry;
use kurbo::Point;

fn shape() -> NodeKind {
    NodeKind::Shape(ShapeData::new(Geometry::Rect))
}

#[test]
fn ids_are_never_reused() {
    let mut graph = SceneGraph::new();
    let a = graph.create(NodeKind::Group);
    graph.destroy(a).unwrap();
    let b = graph.create(NodeKind::Group);
    assert_ne!(a, b);
    assert!(!graph.contains(a));
    assert!(graph.contains(b));
}

#[test]
fn destroyed_nodes_fail_with_invalid_state() {
    let mut graph = SceneGraph::new();
    let a = graph.create(NodeKind::Group);
    graph.destroy(a).unwrap();
    let err = graph.attrs(a).unwrap_err();
    assert!(matches!(err, EaselError::InvalidState(_)));
}

#[test]
fn destroy_removes_the_whole_subtree() {
    let mut graph = SceneGraph::new();
    let root = graph.create(NodeKind::Layer);
    let group = graph.create(NodeKind::Group);
    let leaf = graph.create(shape());
    graph.add_child(root, group).unwrap();
    graph.add_child(group, leaf).unwrap();

    let removed = graph.destroy(group).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(graph.contains(root));
    assert!(!graph.contains(group));
    assert!(!graph.contains(leaf));
    assert_eq!(graph.children(root).unwrap(), &[]);
}

#[test]
fn shapes_cannot_own_children() {
    let mut graph = SceneGraph::new();
    let s = graph.create(shape());
    let child = graph.create(shape());
    assert!(graph.add_child(s, child).is_err());
}

#[test]
fn cycles_are_rejected() {
    let mut graph = SceneGraph::new();
    let a = graph.create(NodeKind::Group);
    let b = graph.create(NodeKind::Group);
    graph.add_child(a, b).unwrap();
    assert!(graph.add_child(b, a).is_err());
    assert!(graph.add_child(a, a).is_err());
}

#[test]
fn reparenting_moves_between_child_lists() {
    let mut graph = SceneGraph::new();
    let a = graph.create(NodeKind::Group);
    let b = graph.create(NodeKind::Group);
    let child = graph.create(shape());
    graph.add_child(a, child).unwrap();
    graph.add_child(b, child).unwrap();
    assert_eq!(graph.children(a).unwrap(), &[]);
    assert_eq!(graph.children(b).unwrap(), &[child]);
    assert_eq!(graph.parent(child).unwrap(), Some(b));
}

#[test]
fn z_order_operations() {
    let mut graph = SceneGraph::new();
    let parent = graph.create(NodeKind::Group);
    let a = graph.create(shape());
    let b = graph.create(shape());
    let c = graph.create(shape());
    for id in [a, b, c] {
        graph.add_child(parent, id).unwrap();
    }

    graph.move_to_top(a).unwrap();
    assert_eq!(graph.children(parent).unwrap(), &[b, c, a]);
    graph.move_to_bottom(a).unwrap();
    assert_eq!(graph.children(parent).unwrap(), &[a, b, c]);
    graph.move_up(a).unwrap();
    assert_eq!(graph.children(parent).unwrap(), &[b, a, c]);
    graph.move_down(c).unwrap();
    assert_eq!(graph.children(parent).unwrap(), &[b, c, a]);
    // Out-of-range indexes clamp instead of failing.
    graph.move_to_index(b, 99).unwrap();
    assert_eq!(graph.children(parent).unwrap(), &[c, a, b]);
    assert_eq!(graph.z_index(b).unwrap(), 2);
}

#[test]
fn owning_layer_walks_up_to_the_nearest_layer() {
    let mut graph = SceneGraph::new();
    let layer = graph.create(NodeKind::Layer);
    let group = graph.create(NodeKind::Group);
    let leaf = graph.create(shape());
    graph.add_child(layer, group).unwrap();
    graph.add_child(group, leaf).unwrap();

    assert_eq!(graph.owning_layer(leaf).unwrap(), Some(layer));
    assert_eq!(graph.owning_layer(layer).unwrap(), Some(layer));
    let orphan = graph.create(shape());
    assert_eq!(graph.owning_layer(orphan).unwrap(), None);
}

#[test]
fn absolute_transform_composes_ancestors() {
    let mut graph = SceneGraph::new();
    let parent = graph.create(NodeKind::Group);
    let child = graph.create(shape());
    graph.add_child(parent, child).unwrap();
    graph.set_attr(parent, "x", 10.0).unwrap();
    graph.set_attr(child, "x", 5.0).unwrap();

    let p = graph.absolute_transform(child).unwrap() * Point::ORIGIN;
    assert!((p.x - 15.0).abs() < 1e-9);
}

#[test]
fn cached_transform_recomputes_after_any_ancestor_change() {
    let mut graph = SceneGraph::new();
    let parent = graph.create(NodeKind::Group);
    let child = graph.create(shape());
    graph.add_child(parent, child).unwrap();

    let before = graph.absolute_transform(child).unwrap();
    assert_eq!(before, graph.absolute_transform(child).unwrap());

    graph.set_attr(parent, "x", 42.0).unwrap();
    let after = graph.absolute_transform(child).unwrap();
    assert_ne!(before, after);
    let p = after * Point::ORIGIN;
    assert!((p.x - 42.0).abs() < 1e-9);
}

#[test]
fn non_transform_attrs_do_not_bump_the_generation() {
    let mut graph = SceneGraph::new();
    let n = graph.create(shape());
    let g0 = graph.transform_generation();
    graph.set_attr(n, "fill", crate::foundation::core::Rgba8::rgb(1, 2, 3)).unwrap();
    assert_eq!(graph.transform_generation(), g0);
    graph.set_attr(n, "rotation", 1.0).unwrap();
    assert_eq!(graph.transform_generation(), g0 + 1);
}

#[test]
fn cached_transform_recomputes_after_a_reparent() {
    let mut graph = SceneGraph::new();
    let a = graph.create(NodeKind::Group);
    let b = graph.create(NodeKind::Group);
    let group = graph.create(NodeKind::Group);
    let leaf = graph.create(shape());
    graph.add_child(a, group).unwrap();
    graph.add_child(group, leaf).unwrap();

    // Warm the whole chain, with enough mutations on the old parent that
    // its stamp could shadow the new parent's.
    graph.set_attr(a, "x", 100.0).unwrap();
    graph.set_attr(a, "x", 100.0).unwrap();
    graph.set_attr(a, "x", 100.0).unwrap();
    graph.set_attr(b, "x", 50.0).unwrap();
    let warm = graph.absolute_transform(leaf).unwrap() * Point::ORIGIN;
    assert!((warm.x - 100.0).abs() < 1e-9);

    graph.add_child(b, group).unwrap();
    let moved = graph.absolute_transform(leaf).unwrap() * Point::ORIGIN;
    assert!((moved.x - 50.0).abs() < 1e-9, "x = {}", moved.x);

    graph.detach(group).unwrap();
    let detached = graph.absolute_transform(leaf).unwrap() * Point::ORIGIN;
    assert!(detached.x.abs() < 1e-9);
}
