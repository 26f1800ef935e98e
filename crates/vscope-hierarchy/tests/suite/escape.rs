use pretty_assertions::assert_eq;
use vscope_hierarchy::VirtualFlag::*;
use vscope_hierarchy::VirtualFlags;

use super::fixtures::{am, class, interface, object, vm, Fixture};

#[test]
fn unresolved_superclass_escapes_the_whole_scope() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").extends("Lcom/lib/Missing;").method(vm("f", "()V")),
        class("LB;").extends("LA;").method(vm("f", "()V")),
    ]);
    assert_eq!(fx.flags("LA;", "f", "()V"), TopDef | Escaped);
    assert_eq!(fx.flags("LB;", "f", "()V"), Override | Final | Escaped);

    let missing = fx.ty("Lcom/lib/Missing;");
    let node = fx.analysis.graph.node(missing);
    assert!(node.synthesized && node.external);
    assert_eq!(fx.analysis.graph.parent(fx.ty("LA;")), Some(missing));
}

#[test]
fn external_subclass_clears_final() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("f", "()V")),
        class("LB;").extends("LA;").method(vm("f", "()V")).external(),
        class("LC;").extends("LA;").method(vm("g", "()V")),
    ]);
    assert_eq!(fx.flags("LA;", "f", "()V"), TopDef | Escaped);
    assert_eq!(fx.flags("LB;", "f", "()V"), Override | Final | Escaped);
    // C's own subtree is fully known.
    assert_eq!(fx.flags("LC;", "g", "()V"), TopDef | Final);
}

#[test]
fn hidden_external_subclass_keeps_ancestors_open() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("f", "()V")),
        class("LB;").extends("LA;"),
        class("LLib;").extends("LB;").external(),
    ]);
    assert_eq!(fx.flags("LA;", "f", "()V"), TopDef | Escaped);
}

#[test]
fn declared_external_interface_escapes_inherited_definitions() {
    let fx = Fixture::build(vec![
        object(),
        interface("Ljava/lang/Runnable;")
            .external()
            .method(am("run", "()V")),
        class("LTask;").method(vm("run", "()V")).method(vm("other", "()V")),
        class("LSub;").extends("LTask;").implements("Ljava/lang/Runnable;"),
    ]);
    assert_eq!(fx.flags("LTask;", "run", "()V"), TopDef | Impl | Miranda | Final | Escaped);
    // Anything Sub inherits is reachable from outside through the interface.
    assert_eq!(fx.flags("LTask;", "other", "()V"), TopDef | Final | Escaped);
}

#[test]
fn override_shadows_external_contract_from_its_ancestor() {
    let fx = Fixture::build(vec![
        object(),
        class("LTask;").method(vm("run", "()V")),
        class("LSub;")
            .extends("LTask;")
            .implements("Lcom/lib/Callback;")
            .method(vm("run", "()V")),
    ]);
    assert_eq!(fx.flags("LTask;", "run", "()V"), VirtualFlags::from(TopDef));
    assert_eq!(fx.flags("LSub;", "run", "()V"), Override | Final | Escaped);
}
