//! Reference resolution (layer 9)
//!
//! The final pass. Every reference and every call-site callee is bound to a
//! symbol using all the frozen registries: lexical walk with per-language
//! hoisting, import following across re-export chains, method dispatch
//! through receiver types and the MRO, then the builtin fallback. Unresolved
//! outcomes are recorded, never raised; unresolvable callees get synthetic
//! `<builtin>` definitions so their edges survive.

use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::debug;

use super::inheritance::{resolve_type_name, ClassHierarchy};
use super::module_graph::{ImportTarget, ModuleGraph};
use super::symbol_table::SymbolTable;
use super::type_registry::TypeRegistry;
use crate::analysis::FileAnalysis;
use crate::languages::policy_for;
use crate::shared::models::{
    CallKind, CallRecord, CallSite, DefKind, ImportKind, Point, Receiver, RefKind, Reference,
    ResolutionState, ResolvedReference, ScopeId, SymbolId,
};

/// Per-project resolution counters, surfaced in the result metadata.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ResolutionStats {
    pub references_resolved: usize,
    pub references_builtin: usize,
    pub references_unresolved: usize,
    pub calls_resolved: usize,
    pub calls_synthetic: usize,
}

/// Output of the resolution pass, keyed by file.
#[derive(Debug, Default)]
pub struct ResolutionOutput {
    pub references_by_file: BTreeMap<String, Vec<ResolvedReference>>,
    pub calls_by_file: BTreeMap<String, Vec<CallRecord>>,
    pub stats: ResolutionStats,
}

pub struct Resolver<'a> {
    modules: &'a ModuleGraph,
    registry: &'a TypeRegistry,
    hierarchy: &'a ClassHierarchy,
    symbols: &'a SymbolTable,
    /// Return-type hints of every callable in the project.
    callable_returns: AHashMap<SymbolId, Option<String>>,
}

enum LexicalHit {
    Found(SymbolId),
    /// The name binds to an import that could not be followed.
    ImportDeadEnd(String),
    NotFound,
}

impl<'a> Resolver<'a> {
    pub fn new(
        analyses: &'a [FileAnalysis],
        modules: &'a ModuleGraph,
        registry: &'a TypeRegistry,
        hierarchy: &'a ClassHierarchy,
        symbols: &'a SymbolTable,
    ) -> Self {
        let mut callable_returns = AHashMap::new();
        for analysis in analyses {
            for def in &analysis.definitions {
                if let Some(info) = def.callable_info() {
                    callable_returns.insert(def.id.clone(), info.return_type.clone());
                }
            }
        }
        Self {
            modules,
            registry,
            hierarchy,
            symbols,
            callable_returns,
        }
    }

    /// Resolve every reference and call site; analyses must be path-sorted.
    pub fn resolve_project(&self, analyses: &'a [FileAnalysis]) -> ResolutionOutput {
        let mut output = ResolutionOutput::default();
        for analysis in analyses {
            let (references, calls) = self.resolve_file(analysis, &mut output.stats);
            output
                .references_by_file
                .insert(analysis.file_path.clone(), references);
            output
                .calls_by_file
                .insert(analysis.file_path.clone(), calls);
        }
        debug!(
            resolved = output.stats.references_resolved,
            unresolved = output.stats.references_unresolved,
            "reference resolution complete"
        );
        output
    }

    fn resolve_file(
        &self,
        analysis: &FileAnalysis,
        stats: &mut ResolutionStats,
    ) -> (Vec<ResolvedReference>, Vec<CallRecord>) {
        let mut references = Vec::with_capacity(analysis.references.len());
        for reference in &analysis.references {
            let mut state = ResolutionState::Pending;
            state.advance(self.resolve_reference(analysis, reference));
            match &state {
                ResolutionState::Resolved(_) => stats.references_resolved += 1,
                ResolutionState::Builtin(_) => stats.references_builtin += 1,
                _ => stats.references_unresolved += 1,
            }
            references.push(ResolvedReference::new(reference.clone(), state));
        }

        let mut calls = Vec::with_capacity(analysis.call_sites.len());
        for site in &analysis.call_sites {
            let record = self.resolve_call(analysis, site);
            if record.callee.is_synthetic() || record.callee.is_builtin() {
                stats.calls_synthetic += 1;
            } else {
                stats.calls_resolved += 1;
            }
            calls.push(record);
        }
        (references, calls)
    }

    // ───────────────────────────────────────────────────────────────────
    // References
    // ───────────────────────────────────────────────────────────────────

    fn resolve_reference(&self, analysis: &FileAnalysis, reference: &Reference) -> ResolutionState {
        let at = reference.location.span.start;

        if reference.kind == RefKind::Member {
            return self.resolve_member_reference(analysis, reference, at);
        }

        match self.resolve_lexical(analysis, &reference.name, reference.scope, at) {
            LexicalHit::Found(symbol) => ResolutionState::Resolved(symbol),
            LexicalHit::ImportDeadEnd(reason) => {
                self.builtin_or_unresolved(analysis, &reference.name, reason)
            }
            LexicalHit::NotFound => {
                if let Some(symbol) = self.resolve_via_glob_imports(analysis, &reference.name) {
                    return ResolutionState::Resolved(symbol);
                }
                self.builtin_or_unresolved(
                    analysis,
                    &reference.name,
                    format!("no binding for {:?}", reference.name),
                )
            }
        }
    }

    fn resolve_member_reference(
        &self,
        analysis: &FileAnalysis,
        reference: &Reference,
        at: Point,
    ) -> ResolutionState {
        let Some(receiver) = &reference.receiver else {
            return ResolutionState::Unresolved("member access on complex receiver".into());
        };

        // `self.x` / `this.x` dispatch through the enclosing class.
        let class = if receiver == "self" || receiver == "this" || receiver == "cls" {
            analysis
                .scopes
                .enclosing_class_name(reference.scope)
                .and_then(|name| self.class_by_name(analysis, name))
        } else if let Some(binding) =
            analysis
                .type_bindings
                .lookup(receiver, at, reference.scope, &analysis.scopes)
        {
            binding
                .class_symbol
                .clone()
                .or_else(|| self.class_by_name(analysis, &binding.class_name.clone()))
        } else {
            None
        };

        if let Some(class) = class {
            if let Some(member) = self.find_member(&class, &reference.name) {
                return ResolutionState::Resolved(member);
            }
            return ResolutionState::Unresolved(format!(
                "no member {:?} on {}",
                reference.name, class
            ));
        }

        // Namespace receiver: member of the imported module's exports.
        if let Some(import) = self.modules.namespace_import_of(&analysis.file_path, receiver) {
            if let Some(target) = import.target_file() {
                if let Some(symbol) =
                    self.symbols
                        .resolve_export(self.modules, target, &reference.name)
                {
                    return ResolutionState::Resolved(symbol);
                }
            }
        }

        ResolutionState::Unresolved(format!("untyped receiver {:?}", receiver))
    }

    /// Lexical walk honoring hoisting and forward-reference policy.
    fn resolve_lexical(
        &self,
        analysis: &FileAnalysis,
        name: &str,
        scope: ScopeId,
        at: Point,
    ) -> LexicalHit {
        let policy = policy_for(analysis.language);
        let root = analysis.scopes.root();

        for scope_id in analysis.scopes.chain(scope) {
            let holder = analysis.scopes.get(scope_id);
            let Some(indices) = holder.symbols.get(name) else {
                continue;
            };
            let defs: Vec<_> = indices
                .iter()
                .map(|&i| &analysis.definitions[i])
                .collect();

            // Positional bindings first: the closest preceding one wins.
            let positional = defs
                .iter()
                .filter(|d| d.location.span.start <= at)
                .max_by_key(|d| d.location.span.start);
            let visible = positional.copied().or_else(|| {
                defs.iter()
                    .find(|d| {
                        d.is_hoisted
                            || (scope_id == root
                                && scope != root
                                && policy.forward_top_level_refs())
                    })
                    .copied()
            });

            let Some(def) = visible else {
                continue;
            };
            if def.kind == DefKind::Import {
                return self.follow_import(analysis, def.name.as_str(), &def.location);
            }
            return LexicalHit::Found(def.id.clone());
        }
        LexicalHit::NotFound
    }

    /// Follow an import binding to the exported definition in its target.
    fn follow_import(
        &self,
        analysis: &FileAnalysis,
        local: &str,
        location: &crate::shared::models::Location,
    ) -> LexicalHit {
        let record = self
            .modules
            .resolved_imports(&analysis.file_path)
            .iter()
            .find(|i| i.record.local_name == local && i.record.location == *location)
            .or_else(|| self.modules.import_of(&analysis.file_path, local));
        let Some(resolved) = record else {
            return LexicalHit::NotFound;
        };

        match &resolved.target {
            ImportTarget::File(target) => {
                // Namespace bindings denote the module itself.
                if resolved.record.is_namespace() {
                    return LexicalHit::Found(SymbolId::module(target));
                }
                let wanted = match resolved.record.external_name.as_str() {
                    "*" => local,
                    other => other,
                };
                match self.symbols.resolve_export(self.modules, target, wanted) {
                    Some(symbol) => LexicalHit::Found(symbol),
                    None => LexicalHit::ImportDeadEnd(format!(
                        "{:?} not exported by {}",
                        wanted, target
                    )),
                }
            }
            ImportTarget::External => LexicalHit::ImportDeadEnd(format!(
                "external module {:?}",
                resolved.record.source
            )),
            ImportTarget::Unresolved => LexicalHit::ImportDeadEnd(format!(
                "unresolved module {:?}",
                resolved.record.source
            )),
        }
    }

    /// Wildcard imports (`from m import *`, `use m::*`) re-enter the export
    /// surface of their targets.
    fn resolve_via_glob_imports(&self, analysis: &FileAnalysis, name: &str) -> Option<SymbolId> {
        for import in self.modules.resolved_imports(&analysis.file_path) {
            if import.record.kind != ImportKind::Glob {
                continue;
            }
            if let Some(target) = import.target_file() {
                if let Some(symbol) = self.symbols.resolve_export(self.modules, target, name) {
                    return Some(symbol);
                }
            }
        }
        None
    }

    fn builtin_or_unresolved(
        &self,
        analysis: &FileAnalysis,
        name: &str,
        reason: String,
    ) -> ResolutionState {
        let policy = policy_for(analysis.language);
        if policy.builtins().contains(name) {
            ResolutionState::Builtin(SymbolId::builtin(analysis.language.as_str(), name))
        } else {
            ResolutionState::Unresolved(reason)
        }
    }

    // ───────────────────────────────────────────────────────────────────
    // Calls
    // ───────────────────────────────────────────────────────────────────

    fn resolve_call(&self, analysis: &FileAnalysis, site: &CallSite) -> CallRecord {
        let at = site.location.span.start;

        let (callee, kind) = match site.kind {
            CallKind::Method => (self.resolve_method_callee(analysis, site, at), site.kind),
            CallKind::Constructor => {
                let callee = self.resolve_constructor_callee(analysis, site, at);
                match callee {
                    Some((symbol, adjusted)) => (Some(symbol), adjusted),
                    None => (None, site.kind),
                }
            }
            CallKind::Direct => self.resolve_direct_callee(analysis, site, at),
        };

        let callee = callee.unwrap_or_else(|| {
            let policy = policy_for(analysis.language);
            if policy.builtins().contains(site.callee_name.as_str()) {
                SymbolId::builtin(analysis.language.as_str(), &site.callee_name)
            } else {
                SymbolId::synthetic(&site.callee_name)
            }
        });

        CallRecord::new(site.caller.clone(), callee, kind, site.location.clone())
    }

    fn resolve_direct_callee(
        &self,
        analysis: &FileAnalysis,
        site: &CallSite,
        at: Point,
    ) -> (Option<SymbolId>, CallKind) {
        // Path-qualified calls: `ns::f()` / module chains.
        if let Some(Receiver::Path(segments)) = &site.receiver {
            if let Some(symbol) = self.resolve_path_call(analysis, segments, &site.callee_name) {
                return (Some(symbol), CallKind::Direct);
            }
        }

        match self.resolve_lexical(analysis, &site.callee_name, site.scope, at) {
            LexicalHit::Found(symbol) => {
                // A call of a class-like symbol constructs it.
                if let Some(entry) = self.registry.get(&symbol) {
                    if entry.kind.is_class_like() {
                        let callee = entry
                            .constructor()
                            .map(|c| c.symbol.clone())
                            .unwrap_or_else(|| symbol.clone());
                        return (Some(callee), CallKind::Constructor);
                    }
                }
                (Some(symbol), CallKind::Direct)
            }
            _ => {
                if let Some(symbol) =
                    self.resolve_via_glob_imports(analysis, &site.callee_name)
                {
                    return (Some(symbol), CallKind::Direct);
                }
                (None, CallKind::Direct)
            }
        }
    }

    fn resolve_method_callee(
        &self,
        analysis: &FileAnalysis,
        site: &CallSite,
        at: Point,
    ) -> Option<SymbolId> {
        if let Some(receiver) = &site.receiver {
            if let Some(class) = self.receiver_class(analysis, receiver, at, site.scope, 0) {
                if let Some((method, _)) = self.find_method(&class, &site.callee_name) {
                    return Some(method);
                }
            }

            // Namespace receivers resolve against the module's exports,
            // following nested re-export chains.
            if let Receiver::Identifier(name) = receiver {
                if let Some(import) =
                    self.modules.namespace_import_of(&analysis.file_path, name)
                {
                    if let Some(target) = import.target_file() {
                        return self.symbols.resolve_export(
                            self.modules,
                            target,
                            &site.callee_name,
                        );
                    }
                }
            }
            if let Receiver::Path(segments) = receiver {
                return self.resolve_path_call(analysis, segments, &site.callee_name);
            }
        }
        None
    }

    fn resolve_constructor_callee(
        &self,
        analysis: &FileAnalysis,
        site: &CallSite,
        at: Point,
    ) -> Option<(SymbolId, CallKind)> {
        if let Some(class) = self.class_by_name(analysis, &site.callee_name) {
            let callee = self
                .registry
                .get(&class)
                .and_then(|entry| entry.constructor())
                .map(|c| c.symbol.clone())
                .unwrap_or(class);
            return Some((callee, CallKind::Constructor));
        }

        // The capitalized-name heuristic can tag plain calls as
        // constructions; a lexical hit on a callable downgrades them.
        if let LexicalHit::Found(symbol) =
            self.resolve_lexical(analysis, &site.callee_name, site.scope, at)
        {
            let is_class = self
                .registry
                .get(&symbol)
                .map(|e| e.kind.is_class_like())
                .unwrap_or(false);
            if is_class {
                return Some((symbol, CallKind::Constructor));
            }
            return Some((symbol, CallKind::Direct));
        }
        None
    }

    /// `a::b::f()` and nested namespace chains: resolve the path head as a
    /// module or type, then the callee against it.
    fn resolve_path_call(
        &self,
        analysis: &FileAnalysis,
        segments: &[String],
        callee: &str,
    ) -> Option<SymbolId> {
        let head = segments.first()?;

        // A type head makes this an associated-function call.
        if segments.len() == 1 {
            if let Some(class) = self.class_by_name(analysis, head) {
                if let Some((method, _)) = self.find_method(&class, callee) {
                    return Some(method);
                }
            }
        }

        let import = self.modules.import_of(&analysis.file_path, head)?;
        let mut target = import.target_file()?.to_string();
        // Walk intermediate namespace segments through re-exported modules.
        for segment in &segments[1..] {
            let next = self
                .symbols
                .resolve_export(self.modules, &target, segment)?;
            target = next.file()?.to_string();
        }
        self.symbols.resolve_export(self.modules, &target, callee)
    }

    /// Class of a receiver expression, chained calls resolved inside out.
    fn receiver_class(
        &self,
        analysis: &FileAnalysis,
        receiver: &Receiver,
        at: Point,
        scope: ScopeId,
        depth: usize,
    ) -> Option<SymbolId> {
        if depth > 8 {
            return None;
        }
        match receiver {
            Receiver::Identifier(name) => {
                if let Some(binding) =
                    analysis.type_bindings.lookup(name, at, scope, &analysis.scopes)
                {
                    let class_name = binding.class_name.clone();
                    return binding
                        .class_symbol
                        .clone()
                        .or_else(|| self.class_by_name(analysis, &class_name));
                }
                // A bare type name used as a value (unit structs, statics).
                self.class_by_name(analysis, name)
            }
            Receiver::SelfReceiver => analysis
                .scopes
                .enclosing_class_name(scope)
                .and_then(|name| self.class_by_name(analysis, name)),
            Receiver::Constructed(class_name) => self.class_by_name(analysis, class_name),
            Receiver::Call {
                callee,
                receiver: inner,
            } => {
                let return_hint = match inner {
                    Some(inner_receiver) => {
                        let inner_class =
                            self.receiver_class(analysis, inner_receiver, at, scope, depth + 1)?;
                        let (method, hint) = self.find_method(&inner_class, callee)?;
                        match hint {
                            Some(hint) => Some((Some(inner_class), hint)),
                            None => self
                                .callable_returns
                                .get(&method)
                                .cloned()
                                .flatten()
                                .map(|h| (Some(inner_class), h)),
                        }
                    }
                    None => {
                        // `C().f()` constructs the receiver directly; a free
                        // function contributes its declared return type.
                        match self.resolve_lexical(analysis, callee, scope, at) {
                            LexicalHit::Found(symbol) => {
                                let is_class = self
                                    .registry
                                    .get(&symbol)
                                    .map(|e| e.kind.is_class_like())
                                    .unwrap_or(false);
                                if is_class {
                                    return Some(symbol);
                                }
                                self.callable_returns
                                    .get(&symbol)
                                    .cloned()
                                    .flatten()
                                    .map(|h| (None, h))
                            }
                            _ => {
                                if let Some(class) = self.class_by_name(analysis, callee) {
                                    return Some(class);
                                }
                                None
                            }
                        }
                    }
                };

                if let Some((context_class, hint)) = return_hint {
                    if hint == "Self" {
                        return context_class;
                    }
                    return self.class_by_name(analysis, &hint);
                }

                // Best-effort getter heuristic: `getX` yields `X` when `X`
                // names a known class. Declared hints always win above.
                callee
                    .strip_prefix("get")
                    .filter(|rest| !rest.is_empty())
                    .and_then(|rest| self.class_by_name(analysis, rest))
            }
            Receiver::Path(segments) => {
                let last = segments.last()?;
                self.class_by_name(analysis, last)
            }
            Receiver::Opaque => None,
        }
    }

    /// Resolve a class name in the context of a file: local types, then
    /// imports with re-export chains.
    fn class_by_name(&self, analysis: &FileAnalysis, name: &str) -> Option<SymbolId> {
        resolve_type_name(&analysis.file_path, name, self.registry, self.modules)
    }

    /// Method lookup through the MRO; returns the method symbol and its
    /// declared return-type hint.
    fn find_method(&self, class: &SymbolId, name: &str) -> Option<(SymbolId, Option<String>)> {
        for candidate in self.hierarchy.mro_of(class) {
            if let Some(entry) = self.registry.get(&candidate) {
                if let Some(method) = entry.method(name) {
                    return Some((method.symbol.clone(), method.return_type.clone()));
                }
            }
        }
        None
    }

    /// Method-or-property lookup for member references.
    fn find_member(&self, class: &SymbolId, name: &str) -> Option<SymbolId> {
        if let Some((method, _)) = self.find_method(class, name) {
            return Some(method);
        }
        for candidate in self.hierarchy.mro_of(class) {
            if let Some(entry) = self.registry.get(&candidate) {
                if let Some(property) = entry.property(name) {
                    return Some(property.symbol.clone());
                }
            }
        }
        None
    }
}
