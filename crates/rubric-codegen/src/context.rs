//! Per-run generation state.

use crate::names::UniqueNames;
use crate::types::{self, Converter, TypeCache};
use rubric_decl::{CppType, DeclCache, DeclId};
use rustc_hash::FxHashSet;
use std::path::Path;

/// Everything one generation run shares between builders.
///
/// A context borrows an annotated [`DeclCache`] and owns the type cache,
/// the set of wrapper names handed out so far and the header
/// configuration. Create a new one for every run.
#[derive(Debug)]
pub struct GenerationContext<'c> {
    cache: &'c DeclCache,
    types: TypeCache,
    /// Whitelist of recognized source headers
    sources: Vec<String>,
    /// Extra includes for every generated file
    additional_includes: Vec<String>,
    names: UniqueNames,
    /// Namespaces wrapped by explicit modules
    claimed: FxHashSet<DeclId>,
}

impl<'c> GenerationContext<'c> {
    pub fn new(cache: &'c DeclCache) -> Self {
        Self {
            cache,
            types: TypeCache::new(),
            sources: Vec::new(),
            additional_includes: Vec::new(),
            names: UniqueNames::default(),
            claimed: FxHashSet::default(),
        }
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_additional_includes(
        mut self,
        includes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.additional_includes = includes.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache(&self) -> &'c DeclCache {
        self.cache
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn additional_includes(&self) -> &[String] {
        &self.additional_includes
    }

    pub fn types(&self) -> &TypeCache {
        &self.types
    }

    /// Whether `file` is one of the recognized source headers.
    pub fn is_source(&self, file: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s == file || Path::new(s) == Path::new(file))
    }

    /// Headers to include for `id`: the header it was declared in when that
    /// is a recognized source, every source header otherwise.
    pub fn header_files(&self, id: DeclId) -> Vec<String> {
        match self.cache.decl(id).file.as_deref() {
            Some(file) if self.is_source(file) => vec![file.to_string()],
            _ => self.sources.clone(),
        }
    }

    /// Whether `id` comes from a recognized source header. Namespaces
    /// qualify when anything inside them does; declarations without a
    /// recorded file are assumed to.
    pub fn declared_in_sources(&self, id: DeclId) -> bool {
        let decl = self.cache.decl(id);
        if decl.is_namespace() {
            return decl
                .children
                .iter()
                .any(|&child| self.declared_in_sources(child));
        }
        decl.file.as_deref().map_or(true, |file| self.is_source(file))
    }

    /// Hand out `base`, or `base_1`, `base_2`, ... when taken.
    pub fn unique_name(&mut self, base: &str) -> String {
        self.names.unique(base)
    }

    /// C++ spelling of a class, honouring typedef humanization.
    pub fn class_type(&self, id: DeclId) -> String {
        types::class_type(self.cache, id)
    }

    /// Resolve `ty` as written inside `scope`.
    pub fn resolve(&mut self, scope: DeclId, ty: &CppType) -> CppType {
        self.types.resolve(self.cache, scope, ty)
    }

    /// Resolve a return type and remember any converter it needs.
    pub fn resolve_return(&mut self, scope: DeclId, ty: &CppType) -> CppType {
        let resolved = self.resolve(scope, ty);
        self.types.note_return(self.cache, &resolved);
        resolved
    }

    /// Resolve a parameter type and remember any converter it needs.
    pub fn resolve_param(&mut self, scope: DeclId, ty: &CppType) -> CppType {
        let resolved = self.resolve(scope, ty);
        self.types.note_param(self.cache, &resolved);
        resolved
    }

    pub fn claim_namespace(&mut self, id: DeclId) {
        self.claimed.insert(id);
    }

    pub fn is_claimed(&self, id: DeclId) -> bool {
        self.claimed.contains(&id)
    }

    pub fn into_converters(self) -> Vec<Converter> {
        self.types.into_converters()
    }
}
