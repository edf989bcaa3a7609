//! Entity extraction (layer 2)
//!
//! Walks the CST once, asking the language policy to tag nodes with their
//! semantic role; the symbol factory turns the captures into definitions,
//! references, imports, and exports, minting symbol IDs from scope paths.
//! Import subtrees are collected and skipped so their identifiers never leak
//! into the reference stream.

use std::collections::BTreeMap;
use tree_sitter::Node;

use super::scopes::ScopeTree;
use crate::errors::{ErrorKind, ErrorRecord, Layer};
use crate::languages::{DefCapture, LanguagePolicy};
use crate::shared::models::{
    DefKind, DefPayload, Definition, CallableInfo, ClassInfo, ExportRecord, ImportRecord,
    Location, Reference, ScopeId, ScopeKind, SymbolId,
};

/// Everything layer 2 produces for one file.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub definitions: Vec<Definition>,
    pub references: Vec<Reference>,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    /// `impl Trait for Type` attachments, merged by the type registry.
    pub impl_relations: Vec<(String, Vec<String>)>,
    /// Callable scope → owning symbol, for call-site attribution.
    pub scope_owners: BTreeMap<ScopeId, SymbolId>,
    pub errors: Vec<ErrorRecord>,
}

pub fn extract(
    root: Node,
    source: &str,
    file: &str,
    policy: &dyn LanguagePolicy,
    scopes: &ScopeTree,
) -> ExtractionResult {
    let mut factory = SymbolFactory {
        file,
        source,
        policy,
        scopes,
        result: ExtractionResult::default(),
    };

    // The module symbol anchors module-level call sites and exports.
    factory.result.definitions.push(Definition::new(
        SymbolId::module(file),
        crate::shared::models::MODULE_NAME,
        DefKind::Module,
        Location::new(file, scopes.get(scopes.root()).span),
    ));

    factory.visit(root);
    factory.collect_exports(root);
    factory.result
}

struct SymbolFactory<'a> {
    file: &'a str,
    source: &'a str,
    policy: &'a dyn LanguagePolicy,
    scopes: &'a ScopeTree,
    result: ExtractionResult,
}

impl<'a> SymbolFactory<'a> {
    fn visit(&mut self, node: Node) {
        if self.policy.is_import_node(&node, self.source) {
            self.collect_imports(&node);
            return;
        }
        if let Some(relation) = self.policy.implements_capture(&node, self.source) {
            self.result.impl_relations.push(relation);
        }
        if let Some(capture) = self.policy.definition_capture(&node, self.source) {
            self.make_definition(capture, &node);
        } else if let Some(capture) = self.policy.reference_capture(&node, self.source) {
            let scope = self.scopes.scope_at(capture.span.start);
            let mut reference = Reference::new(
                capture.name,
                Location::new(self.file, capture.span),
                capture.kind,
                scope,
            );
            if let Some(receiver) = capture.receiver {
                reference = reference.with_receiver(receiver);
            }
            self.result.references.push(reference);
        }
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.visit(child);
            }
        }
    }

    fn make_definition(&mut self, capture: DefCapture, node: &Node) {
        if capture.name.is_empty() {
            self.result.errors.push(
                ErrorRecord::new(
                    self.file,
                    Layer::Extraction,
                    ErrorKind::Extract,
                    format!("unnamed {} capture skipped", node.kind()),
                )
                .with_span(capture.name_span),
            );
            return;
        }

        // Defs that open their own scope belong to the scope *around* it.
        let own_scope = self
            .policy
            .scope_capture(node, self.source)
            .and_then(|c| self.scopes.scope_with_span(c.span));
        let mut scope = self.scopes.scope_at(capture.name_span.start);
        if Some(scope) == own_scope {
            scope = self
                .scopes
                .get(scope)
                .parent
                .unwrap_or_else(|| self.scopes.root());
        }

        let path = self.scopes.path_of(scope);
        let id = SymbolId::local(self.file, &path, &capture.name, capture.kind.tag());

        let payload = if capture.kind.is_callable() {
            DefPayload::Callable(CallableInfo {
                params: capture.params.iter().map(|p| p.name.clone()).collect(),
                return_type: capture.return_type.clone(),
            })
        } else if capture.kind.is_class_like() {
            DefPayload::ClassLike(ClassInfo {
                extends: capture.extends.clone(),
                implements: capture.implements.clone(),
            })
        } else {
            DefPayload::None
        };

        let exported_implicitly = self.policy.is_implicitly_exported(&capture)
            && self.scopes.get(scope).kind == ScopeKind::Module;

        let mut def = Definition::new(
            id.clone(),
            capture.name.clone(),
            capture.kind,
            Location::new(self.file, capture.name_span),
        )
        .with_scope(scope)
        .with_payload(payload)
        .with_visibility(capture.visibility);
        if let Some(enclosing) = capture.enclosing_span {
            def = def.with_enclosing_span(enclosing);
        }
        if self.policy.is_hoisted(capture.kind, node, self.source) {
            def = def.hoisted();
        }
        if exported_implicitly {
            def = def.exported();
        }
        self.result.definitions.push(def);

        // Callable scopes remember their owner for call attribution.
        if capture.kind.is_callable() {
            if let Some(own) = own_scope {
                self.result.scope_owners.insert(own, id.clone());
            }
        }

        // Parameters live inside the callable's own scope.
        if let Some(own) = own_scope {
            let inner_path = self.scopes.path_of(own);
            for param in &capture.params {
                let param_id = SymbolId::local(
                    self.file,
                    &inner_path,
                    &param.name,
                    DefKind::Parameter.tag(),
                );
                self.result.definitions.push(
                    Definition::new(
                        param_id,
                        param.name.clone(),
                        DefKind::Parameter,
                        Location::new(self.file, param.span),
                    )
                    .with_scope(own),
                );
            }
        }
    }

    fn collect_imports(&mut self, node: &Node) {
        for capture in self.policy.import_captures(node, self.source) {
            let scope = self.scopes.scope_at(capture.span.start);
            let location = Location::new(self.file, capture.span);

            // Each named binding also becomes an import definition so the
            // lexical walk can find it in a scope symbol map.
            if !capture.local_name.is_empty() && capture.local_name != "*" {
                let path = self.scopes.path_of(scope);
                let id = SymbolId::local(
                    self.file,
                    &path,
                    &capture.local_name,
                    DefKind::Import.tag(),
                );
                self.result.definitions.push(
                    Definition::new(id, capture.local_name.clone(), DefKind::Import, location.clone())
                        .with_scope(scope),
                );
            }

            self.result.imports.push(
                ImportRecord::new(
                    capture.local_name,
                    capture.external_name,
                    capture.source,
                    capture.kind,
                    location,
                )
                .with_scope(scope),
            );
        }
    }

    fn collect_exports(&mut self, root: Node) {
        let mut records = Vec::new();

        for capture in self.policy.export_captures(&root, self.source) {
            let mut record = ExportRecord::new(
                capture.local_name.clone(),
                capture.export_name.clone(),
                Location::new(self.file, capture.span),
            );
            if capture.is_default {
                record = record.default_export();
            }
            if let Some(src) = capture.re_export_source {
                record = record.re_exported_from(src);
            } else if let Some(def) = self.find_module_level(&capture.local_name) {
                record = record.with_symbol(def);
            }
            records.push(record);
        }

        // Implicit exports already flagged their definitions; surface them as
        // records too.
        let root_scope = self.scopes.root();
        for def in &self.result.definitions {
            let module_level = self.scopes.get(def.scope).kind == ScopeKind::Module
                && def.scope == root_scope;
            if def.is_exported
                && module_level
                && !records.iter().any(|r: &ExportRecord| r.export_name == def.name)
            {
                records.push(
                    ExportRecord::new(def.name.clone(), def.name.clone(), def.location.clone())
                        .with_symbol(def.id.clone()),
                );
            }
        }

        // Explicit exports flip the flag on their local definitions.
        let explicit: Vec<String> = records
            .iter()
            .filter(|r| r.re_export_source.is_none())
            .map(|r| r.local_name.clone())
            .collect();
        for def in &mut self.result.definitions {
            if def.scope == root_scope && explicit.iter().any(|n| n == &def.name) {
                def.is_exported = true;
            }
        }

        self.result.exports = records;
    }

    fn find_module_level(&self, name: &str) -> Option<SymbolId> {
        self.result
            .definitions
            .iter()
            .find(|d| {
                d.name == name
                    && d.kind != DefKind::Import
                    && self.scopes.get(d.scope).kind == ScopeKind::Module
            })
            .map(|d| d.id.clone())
    }
}
