//! Property tests for the stable building blocks.

use proptest::prelude::*;

use polygraph_core::{Point, ResolutionState, Span, SymbolId};

fn identifier() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,12}"
}

proptest! {
    // Minting the same symbol twice always yields the same ID, and distinct
    // names never collide within one scope.
    #[test]
    fn symbol_ids_deterministic_and_injective(
        file in "[a-z]{1,8}\\.(py|rs|ts|js)",
        path in prop::collection::vec(identifier(), 0..4),
        a in identifier(),
        b in identifier(),
    ) {
        let scope_path = path.join("/");
        let first = SymbolId::local(&file, &scope_path, &a, None);
        let second = SymbolId::local(&file, &scope_path, &a, None);
        prop_assert_eq!(&first, &second);

        if a != b {
            let other = SymbolId::local(&file, &scope_path, &b, None);
            prop_assert_ne!(&first, &other);
        }
    }

    // The trailing name survives minting, tags stripped.
    #[test]
    fn symbol_name_extraction(
        file in "[a-z]{1,8}\\.py",
        path in prop::collection::vec(identifier(), 0..3),
        name in identifier(),
        tag in prop::option::of("[a-z]{2,6}"),
    ) {
        let id = SymbolId::local(&file, &path.join("/"), &name, tag.as_deref());
        prop_assert_eq!(id.name(), name.as_str());
    }

    // Builtin IDs never collide with local IDs.
    #[test]
    fn builtin_ids_distinct_from_locals(
        lang in "(javascript|typescript|python|rust)",
        name in identifier(),
    ) {
        let builtin = SymbolId::builtin(&lang, &name);
        prop_assert!(builtin.is_builtin());
        let local = SymbolId::local("f.py", "", &name, None);
        prop_assert_ne!(builtin, local);
    }

    // Span containment is a partial order: reflexive-ish on non-empty spans,
    // antisymmetric, transitive.
    #[test]
    fn span_containment_transitive(
        a in 0u32..50, b in 1u32..50,
        c in 0u32..50, d in 1u32..50,
        e in 0u32..50, f in 1u32..50,
    ) {
        let make = |start: u32, len: u32| Span::new(
            start,
            start + len,
            Point::new(0, start),
            Point::new(0, start + len),
        );
        let outer = make(a, b + c + d + e + f);
        let middle = make(a + c, b + d + e);
        let inner = make(a + c + e, b.min(d));

        if outer.contains(&middle) && middle.contains(&inner) {
            prop_assert!(outer.contains(&inner));
        }
    }

    // Resolution states transition monotonically: once terminal, the state
    // never changes again, whatever is thrown at it.
    #[test]
    fn resolution_state_monotone(
        names in prop::collection::vec(identifier(), 1..6),
    ) {
        let mut state = ResolutionState::Pending;
        state.advance(ResolutionState::Resolved(SymbolId::local(
            "m.py", "", &names[0], None,
        )));
        let settled = state.clone();
        for name in &names {
            state.advance(ResolutionState::Unresolved(format!("late {}", name)));
            state.advance(ResolutionState::Builtin(SymbolId::builtin("python", name)));
            prop_assert_eq!(&state, &settled);
        }
    }
}

// Analyzing the same sources under permuted file creation order yields the
// same graph (the project layers sort by path before folding).
#[tokio::test]
async fn file_order_permutation_stability() {
    use std::fs;

    let files = [
        ("a.py", "from b import g\n\ndef f():\n    return g()\n"),
        ("b.py", "def g():\n    return 1\n"),
        ("c.py", "from a import f\nf()\n"),
    ];

    let mut snapshots = Vec::new();
    for order in [[0, 1, 2], [2, 0, 1], [1, 2, 0]] {
        let dir = tempfile::tempdir().unwrap();
        for &i in &order {
            let (name, content) = files[i];
            fs::write(dir.path().join(name), content).unwrap();
        }
        let config = polygraph_core::AnalysisConfig::new(dir.path());
        let graph = polygraph_core::analyze_project(&config).await.unwrap();

        let mut value = serde_json::to_value(&graph).unwrap();
        value["metadata"]["analysis_time_ms"] = 0.into();
        value["metadata"]["root_path"] = "".into();
        snapshots.push(serde_json::to_string(&value).unwrap());
    }
    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[1], snapshots[2]);
}
