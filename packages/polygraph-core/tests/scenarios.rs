//! End-to-end scenario tests over on-disk fixtures.

use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use polygraph_core::{
    analyze_project, AnalysisConfig, CallKind, ProjectGraph, ResolutionState, SymbolId,
};

fn write_project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (rel, content) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write fixture");
    }
    dir
}

async fn analyze(root: &Path) -> ProjectGraph {
    let config = AnalysisConfig::new(root);
    analyze_project(&config).await.expect("analysis")
}

fn method_edges(graph: &ProjectGraph) -> Vec<(&str, &str)> {
    graph
        .calls
        .edges
        .iter()
        .filter(|e| e.kind == CallKind::Method)
        .map(|e| (e.caller.as_str(), e.callee.as_str()))
        .collect()
}

#[tokio::test]
async fn js_method_on_constructed_instance() {
    let dir = write_project(&[(
        "app.js",
        "class A { greet() { return 1; } }\nconst a = new A();\na.greet();\n",
    )]);
    let graph = analyze(dir.path()).await;

    // Call edge from module level to A.greet, tagged as a method call.
    assert!(method_edges(&graph).contains(&("app.js#<module>", "app.js#A#greet")));

    // Class node for A with method greet.
    let a = SymbolId::local("app.js", "", "A", Some("class"));
    assert!(graph.classes.get(&a).is_some());

    // Type binding a → A anchored at the declaration line.
    let file = graph.file("app.js").unwrap();
    let binding = file
        .analysis
        .type_bindings
        .iter()
        .find(|b| b.variable == "a")
        .unwrap();
    assert_eq!(binding.class_name, "A");
    assert_eq!(binding.position.row, 1);
}

#[tokio::test]
async fn python_import_and_method_call() {
    let dir = write_project(&[
        ("lib.py", "class C:\n    def f(self):\n        pass\n"),
        ("main.py", "from lib import C\nC().f()\n"),
    ]);
    let graph = analyze(dir.path()).await;

    assert!(method_edges(&graph).contains(&("main.py#<module>", "lib.py#C#f")));

    // C is exported from lib.py.
    let c = SymbolId::local("lib.py", "", "C", Some("class"));
    assert!(graph.symbols.get(&c).unwrap().entry.is_exported);

    // The constructor call resolves to class C.
    let main = graph.file("main.py").unwrap();
    let ctor = main
        .constructor_calls
        .iter()
        .find(|c| c.callee.name() == "C")
        .expect("constructor call");
    assert_eq!(ctor.callee, c);
}

#[tokio::test]
async fn rust_use_and_trait_method() {
    let dir = write_project(&[
        ("src/lib.rs", "pub mod a;\npub mod b;\n"),
        ("src/a.rs", "pub trait T {\n    fn m(&self);\n}\n"),
        (
            "src/b.rs",
            "use crate::a::T;\n\npub struct S;\n\nimpl T for S {\n    fn m(&self) {}\n}\n\npub fn main() {\n    S.m();\n}\n",
        ),
    ]);
    let graph = analyze(dir.path()).await;

    // S implements T.
    let s = SymbolId::local("src/b.rs", "", "S", Some("struct"));
    let t = SymbolId::local("src/a.rs", "", "T", Some("trait"));
    let node = graph.classes.get(&s).expect("S in hierarchy");
    assert_eq!(node.implements, vec![t.clone()]);

    // S.m() resolves to the impl method, with T in the resolution path.
    assert!(method_edges(&graph).contains(&("src/b.rs#main", "src/b.rs#S#m")));
    assert!(node.mro.contains(&t));
}

#[tokio::test]
async fn method_chain_with_return_types() {
    let dir = write_project(&[(
        "chain.ts",
        "class C { doit() {} }\nclass B { inner(): C { return new C(); } }\nnew B().inner().doit();\n",
    )]);
    let graph = analyze(dir.path()).await;

    let edges = method_edges(&graph);
    assert!(edges.contains(&("chain.ts#<module>", "chain.ts#C#doit")));
    assert!(edges.contains(&("chain.ts#<module>", "chain.ts#B#inner")));
}

#[tokio::test]
async fn diamond_inheritance() {
    let dir = write_project(&[(
        "diamond.py",
        "class Base:\n    pass\n\nclass L(Base):\n    pass\n\nclass R(Base):\n    pass\n\nclass D(L, R):\n    pass\n",
    )]);
    let graph = analyze(dir.path()).await;

    let d = graph
        .classes
        .get(&SymbolId::local("diamond.py", "", "D", Some("class")))
        .expect("D");

    let ancestors: Vec<&str> = d.all_ancestors.iter().map(|s| s.name()).collect();
    assert_eq!(ancestors.len(), 3, "Base must appear exactly once");
    for name in ["L", "R", "Base"] {
        assert!(ancestors.contains(&name));
    }

    let mro: Vec<&str> = d.mro.iter().map(|s| s.name()).collect();
    let l = mro.iter().position(|n| *n == "L").unwrap();
    let r = mro.iter().position(|n| *n == "R").unwrap();
    assert!(l < r, "L resolves before R");
}

#[tokio::test]
async fn namespace_re_export() {
    let dir = write_project(&[
        ("math/ops.ts", "export function add() { return 0; }\n"),
        ("math/index.ts", "export * from './ops';\n"),
        (
            "main.ts",
            "import * as math from './math';\nmath.add();\n",
        ),
    ]);
    let graph = analyze(dir.path()).await;

    assert!(method_edges(&graph).contains(&("main.ts#<module>", "math/ops.ts#add")));
}

// ───────────────────────────────────────────────────────────────────────
// Universal invariants
// ───────────────────────────────────────────────────────────────────────

fn mixed_fixture() -> tempfile::TempDir {
    write_project(&[
        ("lib.py", "class C:\n    def f(self):\n        pass\n\ndef helper():\n    return 1\n"),
        ("main.py", "from lib import C, helper\n\ndef run():\n    c = C()\n    c.f()\n    return helper()\n\nrun()\n"),
        ("web/app.js", "class App { start() { console.log('go'); } }\nconst app = new App();\napp.start();\n"),
        ("src/lib.rs", "pub mod core;\n"),
        ("src/core.rs", "pub struct Engine;\n\nimpl Engine {\n    pub fn new() -> Self {\n        Engine\n    }\n\n    pub fn run(&self) {}\n}\n\npub fn boot() {\n    let engine = Engine::new();\n    engine.run();\n}\n"),
    ])
}

#[tokio::test]
async fn invariant_definitions_contained_in_their_scope() {
    let dir = mixed_fixture();
    let graph = analyze(dir.path()).await;

    for file in graph.files.values() {
        if file.analysis.has_parse_error() {
            continue;
        }
        for def in &file.analysis.definitions {
            let scope = file.analysis.scopes.get(def.scope);
            let contained = scope.span.contains_point(def.location.span.start)
                || def.scope == file.analysis.scopes.root();
            assert!(
                contained,
                "{}: definition {} outside scope {:?}",
                file.analysis.file_path, def.name, def.scope
            );
        }
    }
}

#[tokio::test]
async fn invariant_resolved_references_exist_in_index() {
    let dir = mixed_fixture();
    let graph = analyze(dir.path()).await;

    for file in graph.files.values() {
        for resolved in &file.resolved_references {
            match &resolved.state {
                ResolutionState::Resolved(symbol) | ResolutionState::Builtin(symbol) => {
                    assert!(
                        graph.symbols.contains(symbol) || symbol.as_str().ends_with("#<module>"),
                        "resolved symbol {} missing from index",
                        symbol
                    );
                }
                ResolutionState::Pending => panic!("reference left pending"),
                ResolutionState::Unresolved(_) => {}
            }
        }
    }
}

#[tokio::test]
async fn invariant_call_edges_have_endpoints() {
    let dir = mixed_fixture();
    let graph = analyze(dir.path()).await;
    assert!(graph.calls.check_integrity());
}

#[tokio::test]
async fn invariant_ancestor_closure_equation() {
    let dir = write_project(&[(
        "h.py",
        "class A:\n    pass\n\nclass B(A):\n    pass\n\nclass C(B):\n    pass\n",
    )]);
    let graph = analyze(dir.path()).await;

    for node in graph.classes.nodes.values() {
        // Ancestors = direct parents plus their ancestor sets.
        let mut expected: Vec<&SymbolId> = Vec::new();
        for parent in node.extends.iter().chain(node.implements.iter()) {
            if !expected.contains(&parent) {
                expected.push(parent);
            }
            if let Some(parent_node) = graph.classes.get(parent) {
                for ancestor in &parent_node.all_ancestors {
                    if !expected.contains(&ancestor) {
                        expected.push(ancestor);
                    }
                }
            }
        }
        assert_eq!(node.all_ancestors.len(), expected.len());
        for symbol in expected {
            assert!(node.all_ancestors.contains(symbol));
        }
        assert!(
            !node.all_ancestors.contains(&node.symbol),
            "{} is its own ancestor",
            node.symbol
        );
    }
}

#[tokio::test]
async fn invariant_import_export_agreement() {
    let dir = mixed_fixture();
    let graph = analyze(dir.path()).await;

    for (file, imports) in &graph.modules.imports_by_file {
        for import in imports {
            let Some(target) = import.target_file() else {
                continue;
            };
            let wanted = match import.record.external_name.as_str() {
                "*" => continue,
                other => other,
            };
            let exported = graph
                .modules
                .exports(target)
                .iter()
                .find(|e| e.export_name == wanted && e.symbol.is_some());
            if let Some(export) = exported {
                let via_index = graph
                    .symbols
                    .in_file(target)
                    .find(|s| s.entry.name == wanted && s.entry.is_exported);
                assert!(
                    via_index.is_some(),
                    "{}: export {:?} of {} missing from index",
                    file,
                    export.export_name,
                    target
                );
            }
        }
    }
}

#[tokio::test]
async fn invariant_reanalysis_is_byte_identical() {
    let dir = mixed_fixture();
    let first = analyze(dir.path()).await;
    let second = analyze(dir.path()).await;

    let mut a = serde_json::to_value(&first).unwrap();
    let mut b = serde_json::to_value(&second).unwrap();
    a["metadata"]["analysis_time_ms"] = 0.into();
    b["metadata"]["analysis_time_ms"] = 0.into();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

// ───────────────────────────────────────────────────────────────────────
// Failure semantics
// ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parse_failure_is_isolated() {
    let dir = write_project(&[
        ("bad.py", "def (:\n"),
        ("good.py", "def fine():\n    pass\n"),
    ]);
    let graph = analyze(dir.path()).await;

    let bad = graph.file("bad.py").unwrap();
    assert!(bad.analysis.has_parse_error());

    let good = graph.file("good.py").unwrap();
    assert!(!good.analysis.has_parse_error());
    assert!(graph
        .symbols
        .contains(&SymbolId::local("good.py", "", "fine", None)));
}

#[tokio::test]
async fn cyclic_imports_do_not_overflow() {
    let dir = write_project(&[
        ("a.py", "from b import g\n\ndef f():\n    return g()\n"),
        ("b.py", "from a import f\n\ndef g():\n    return f()\n"),
    ]);
    let graph = analyze(dir.path()).await;

    assert_eq!(graph.modules.cycles.len(), 1);
    // Both directions still resolve through the cycle.
    let a_calls: Vec<&str> = graph
        .file("a.py")
        .unwrap()
        .function_calls
        .iter()
        .map(|c| c.callee.as_str())
        .collect();
    assert!(a_calls.contains(&"b.py#g"));
}

#[tokio::test]
async fn entry_points_are_uncalled_nodes() {
    let dir = write_project(&[(
        "e.py",
        "def main():\n    helper()\n\ndef helper():\n    pass\n",
    )]);
    let graph = analyze(dir.path()).await;

    let main = SymbolId::local("e.py", "", "main", None);
    let helper = SymbolId::local("e.py", "", "helper", None);
    assert!(graph.calls.node(&main).unwrap().is_entry_point);
    assert!(!graph.calls.node(&helper).unwrap().is_entry_point);
}

#[tokio::test]
async fn metadata_language_stats() {
    let dir = mixed_fixture();
    let graph = analyze(dir.path()).await;

    let stats: BTreeMap<String, usize> = graph
        .metadata
        .language_stats
        .iter()
        .map(|(l, c)| (l.to_string(), *c))
        .collect();
    assert_eq!(stats["python"], 2);
    assert_eq!(stats["javascript"], 1);
    assert_eq!(stats["rust"], 2);
    assert_eq!(graph.metadata.file_count, 5);
}
