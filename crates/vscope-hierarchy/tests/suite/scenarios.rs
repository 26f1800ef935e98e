use pretty_assertions::assert_eq;
use vscope_hierarchy::VirtualFlag::*;
use vscope_hierarchy::VirtualFlags;

use super::fixtures::{am, class, interface, object, vm, Fixture, OBJECT, OBJECT_METHOD_NAMES};

/// class A { void f() {} }
/// class B { void g() {} }
#[test]
fn no_override() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("f", "()V")),
        class("LB;").method(vm("g", "()V")),
    ]);
    let sm = &fx.analysis.signatures;

    assert_eq!(sm.len(), OBJECT_METHOD_NAMES + 2);
    let wait = fx.ctx.get_name("wait").unwrap();
    assert_eq!(sm.protos(wait).map(|p| p.len()), Some(3));

    for scope in sm.iter_scopes() {
        assert_eq!(scope.methods.len(), 1);
        assert!(scope.interfaces.is_empty());
    }
    fx.assert_flags(
        &[
            ("LA;", "f", "()V", TopDef | Final),
            ("LB;", "g", "()V", TopDef | Final),
        ],
        TopDef | Final | Escaped,
    );
}

/// class A { void f() {} }
/// class B { void g() {} void f() {} }
///   class C extends B {}
///     class D extends C { void f() {} }
///     class E extends C { void g() {} }
#[test]
fn override_growth() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("f", "()V")),
        class("LB;").method(vm("g", "()V")).method(vm("f", "()V")),
        class("LC;").extends("LB;"),
        class("LD;").extends("LC;").method(vm("f", "()V")),
        class("LE;").extends("LC;").method(vm("g", "()V")),
    ]);

    fx.assert_flags(
        &[
            ("LA;", "f", "()V", TopDef | Final),
            ("LB;", "g", "()V", TopDef.into()),
            ("LB;", "f", "()V", TopDef.into()),
            ("LD;", "f", "()V", Override | Final),
            ("LE;", "g", "()V", Override | Final),
        ],
        TopDef | Final | Escaped,
    );

    let f_scopes = fx.analysis.signatures.scopes(fx.sig("f", "()V"));
    assert_eq!(f_scopes.len(), 2);
    assert_eq!(fx.owners(&f_scopes[0]), vec!["LA;"]);
    assert_eq!(fx.owners(&f_scopes[1]), vec!["LB;", "LD;"]);
    assert_eq!(f_scopes[1].root, fx.ty("LB;"));
    assert_eq!(fx.owners(fx.scope("LE;", "g", "()V")), vec!["LB;", "LE;"]);
}

/// class A { void f() {} }
///   class F extends A { void f(int) {} boolean equals(Object) {} }
/// class B { void g() {} void f() {} }
///   class C extends B { void g(int) {} }
///     class D extends C { void f() {} void g(int) {} }
///     class E extends C { void g() {} void g(int) {} }
#[test]
fn override_and_overload() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("f", "()V")),
        class("LF;")
            .extends("LA;")
            .method(vm("f", "(I)V"))
            .method(vm("equals", "(Ljava/lang/Object;)Z")),
        class("LB;").method(vm("g", "()V")).method(vm("f", "()V")),
        class("LC;").extends("LB;").method(vm("g", "(I)V")),
        class("LD;")
            .extends("LC;")
            .method(vm("f", "()V"))
            .method(vm("g", "(I)V")),
        class("LE;")
            .extends("LC;")
            .method(vm("g", "()V"))
            .method(vm("g", "(I)V")),
    ]);

    assert_eq!(fx.analysis.signatures.len(), OBJECT_METHOD_NAMES + 2);
    fx.assert_flags(
        &[
            (OBJECT, "equals", "(Ljava/lang/Object;)Z", TopDef | Escaped),
            ("LF;", "equals", "(Ljava/lang/Object;)Z", Override | Final | Escaped),
            ("LA;", "f", "()V", TopDef | Final),
            ("LF;", "f", "(I)V", TopDef | Final),
            ("LB;", "g", "()V", TopDef.into()),
            ("LB;", "f", "()V", TopDef.into()),
            ("LC;", "g", "(I)V", TopDef.into()),
            ("LD;", "f", "()V", Override | Final),
            ("LD;", "g", "(I)V", Override | Final),
            ("LE;", "g", "()V", Override | Final),
            ("LE;", "g", "(I)V", Override | Final),
        ],
        TopDef | Final | Escaped,
    );

    let g_int = fx.analysis.signatures.scopes(fx.sig("g", "(I)V"));
    assert_eq!(g_int.len(), 1);
    assert_eq!(fx.owners(&g_int[0]), vec!["LC;", "LD;", "LE;"]);
}

/// interface Intf1 { void f(); }
/// class A { void f() {} }
///   class F extends A { void f(int) {} boolean equals(Object) {} }
/// class B implements Intf1 { void g() {} void f() {} }
///   class C extends B { void g(int) {} }
///     class D extends C { void f() {} void g(int) {} }
///     class E extends C { void g() {} void g(int) {} }
#[test]
fn interface_with_local_implementation() {
    let fx = Fixture::build(vec![
        object(),
        interface("LIntf1;").method(am("f", "()V")),
        class("LA;").method(vm("f", "()V")),
        class("LF;")
            .extends("LA;")
            .method(vm("f", "(I)V"))
            .method(vm("equals", "(Ljava/lang/Object;)Z")),
        class("LB;")
            .implements("LIntf1;")
            .method(vm("g", "()V"))
            .method(vm("f", "()V")),
        class("LC;").extends("LB;").method(vm("g", "(I)V")),
        class("LD;")
            .extends("LC;")
            .method(vm("f", "()V"))
            .method(vm("g", "(I)V")),
        class("LE;")
            .extends("LC;")
            .method(vm("g", "()V"))
            .method(vm("g", "(I)V")),
    ]);

    assert_eq!(fx.analysis.signatures.len(), OBJECT_METHOD_NAMES + 2);
    fx.assert_flags(
        &[
            (OBJECT, "equals", "(Ljava/lang/Object;)Z", TopDef | Escaped),
            ("LF;", "equals", "(Ljava/lang/Object;)Z", Override | Final | Escaped),
            ("LA;", "f", "()V", TopDef | Final),
            ("LF;", "f", "(I)V", TopDef | Final),
            ("LB;", "g", "()V", TopDef.into()),
            ("LB;", "f", "()V", TopDef | Impl | Miranda),
            ("LC;", "g", "(I)V", TopDef.into()),
            ("LD;", "f", "()V", Override | Impl | Final),
            ("LD;", "g", "(I)V", Override | Final),
            ("LE;", "g", "()V", Override | Final),
            ("LE;", "g", "(I)V", Override | Final),
        ],
        TopDef | Final | Escaped,
    );

    let f_scopes = fx.analysis.signatures.scopes(fx.sig("f", "()V"));
    assert_eq!(f_scopes.len(), 2);
    assert_eq!(fx.owners(fx.scope("LD;", "f", "()V")), vec!["LB;", "LD;"]);
    assert!(fx.scope("LA;", "f", "()V").interfaces.is_empty());

    let intf1 = fx.ty("LIntf1;");
    let scope = fx.scope("LB;", "f", "()V");
    assert_eq!(scope.interfaces.iter().copied().collect::<Vec<_>>(), vec![intf1]);
    assert_eq!(
        fx.analysis.servicing_scope(&fx.ctx, "LIntf1;", "f", "()V"),
        Some(scope)
    );
    // Scope members are listed, interface obligations are not.
    let intf1_f = fx.method("LIntf1;", "f", "()V");
    assert_eq!(fx.analysis.signatures.flags_of(intf1_f), None);
    assert_eq!(
        fx.analysis.signatures.interface_methods(fx.sig("f", "()V")),
        &[intf1_f]
    );
}

/// The universal root's `equals` is external: every program override escapes, the leaves stay
/// final.
#[test]
fn root_escape_reaches_every_override() {
    let fx = Fixture::build(vec![
        object(),
        class("LA;").method(vm("equals", "(Ljava/lang/Object;)Z")),
        class("LB;").extends("LA;").method(vm("equals", "(Ljava/lang/Object;)Z")),
        class("LC;").method(vm("equals", "(Ljava/lang/Object;)Z")),
    ]);
    let eq = "(Ljava/lang/Object;)Z";
    assert_eq!(fx.flags(OBJECT, "equals", eq), TopDef | Escaped);
    assert_eq!(fx.flags("LA;", "equals", eq), Override | Escaped);
    assert_eq!(fx.flags("LB;", "equals", eq), Override | Final | Escaped);
    assert_eq!(fx.flags("LC;", "equals", eq), Override | Final | Escaped);

    let scope = fx.scope("LB;", "equals", eq);
    assert_eq!(fx.owners(scope), vec![OBJECT, "LA;", "LB;", "LC;"]);
    assert_eq!(scope.root, fx.analysis.graph.root());
}

#[test]
fn internal_root_without_overrides_is_final() {
    let fx = Fixture::build(vec![
        vscope_classfile::ClassStub::class(OBJECT)
            .unwrap()
            .method(vm("hashCode", "()I")),
        class("LA;"),
    ]);
    assert_eq!(fx.flags(OBJECT, "hashCode", "()I"), TopDef | Final);
}

#[test]
fn every_flag_set_is_reported_by_stats() {
    let fx = Fixture::build(vec![
        object(),
        class("LB;").method(vm("f", "()V")),
        class("LD;").extends("LB;").method(vm("f", "()V")),
    ]);
    let stats = fx.analysis.signatures.stats();
    assert_eq!(stats.scopes, 11);
    assert_eq!(stats.methods, 12);
    assert_eq!(stats.flag_counts.get(&Override), Some(&1));
    assert_eq!(stats.flag_counts.get(&Escaped), Some(&10));
    assert_eq!(
        fx.analysis
            .signatures
            .iter_methods()
            .filter(|m| m.flags == VirtualFlags::from(TopDef))
            .count(),
        1
    );
}
