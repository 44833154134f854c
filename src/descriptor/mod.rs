//! Generated CMake descriptors.
//!
//! Two kinds of file are rendered with tera:
//!
//! - the per-node initial-cache script (`glean_init.cmake`), handed to the
//!   configure step with `-C`. It records where the dependency came from and
//!   where it installs to;
//! - the export descriptor, an `ExternalProject_Add` list for the whole graph
//!   that a superbuild can include instead of letting glean run the builds.
//!
//! Values are escaped for CMake quoted arguments before they reach the
//! template.

use anyhow::Result;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use crate::cache::CacheEntry;
use crate::constants::DEFAULT_REF;
use crate::core::GleanError;
use crate::manifest::DependencySpec;
use crate::utils::fs::atomic_write;

const NODE_TEMPLATE_NAME: &str = "glean_init.cmake";
const EXPORT_TEMPLATE_NAME: &str = "glean_deps.cmake";

const NODE_TEMPLATE: &str = r#"# Generated by glean for {{ project_name }}. Do not edit.
set(GLEAN_PROJECT_NAME "{{ project_name }}" CACHE STRING "glean dependency name" FORCE)
set(GLEAN_GIT_REPOSITORY "{{ git_repo }}" CACHE STRING "glean dependency remote" FORCE)
set(GLEAN_GIT_TAG "{{ git_tag }}" CACHE STRING "glean dependency ref" FORCE)
set(GLEAN_SOURCE_DIR "{{ source_directory }}" CACHE PATH "glean dependency sources" FORCE)
set(GLEAN_INSTALL_DIR "{{ install_directory }}" CACHE PATH "glean install prefix" FORCE)
{%- for arg in cmake_args %}
# extra argument: {{ arg }}
{%- endfor %}
"#;

const EXPORT_TEMPLATE: &str = r#"# Generated by glean. Do not edit.
# Include this file from a superbuild CMakeLists.txt.
include(ExternalProject)
{% for project in projects %}
ExternalProject_Add({{ project.project_name }}
  GIT_REPOSITORY "{{ project.git_repo }}"
  GIT_TAG "{{ project.git_tag }}"
{%- if not project.recurse_submodules %}
  GIT_SUBMODULES ""
{%- endif %}
  INSTALL_DIR "{{ install_directory }}"
  CMAKE_ARGS
    "-DCMAKE_INSTALL_PREFIX={{ install_directory }}"
    "-DCMAKE_PREFIX_PATH={{ install_directory }}"
    "-DCMAKE_BUILD_TYPE=${CMAKE_BUILD_TYPE}"
{%- if project.has_glean %}
    "-DGLEAN_INSTALL_ROOT={{ install_directory }}"
{%- endif %}
{%- for arg in project.cmake_args %}
    "{{ arg }}"
{%- endfor %}
{%- if project.depends %}
  DEPENDS {{ project.depends | join(sep=" ") }}
{%- endif %}
)
{% endfor -%}
"#;

/// Escape a value for use inside a CMake quoted argument.
#[must_use]
pub fn cmake_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            ';' => escaped.push_str("\\;"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn render(name: &str, template: &str, context: &TeraContext) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template).map_err(|e| GleanError::TemplateError {
        name: name.to_string(),
        reason: format_tera_error(&e),
    })?;
    let rendered = tera.render(name, context).map_err(|e| GleanError::TemplateError {
        name: name.to_string(),
        reason: format_tera_error(&e),
    })?;
    Ok(rendered)
}

fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        messages.push(err.to_string());
        source = err.source();
    }
    messages.join(": ")
}

/// Render the initial-cache script of one node.
pub fn render_node(
    spec: &DependencySpec,
    entry: &CacheEntry,
    install_prefix: &std::path::Path,
    cmake_args: &[String],
) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("project_name", &cmake_escape(&spec.project_name));
    context.insert("git_repo", &cmake_escape(&spec.remote_uri));
    context.insert("git_tag", &cmake_escape(spec.reference().unwrap_or(DEFAULT_REF)));
    context.insert("source_directory", &cmake_escape(&entry.source_dir.display().to_string()));
    context.insert("install_directory", &cmake_escape(&install_prefix.display().to_string()));
    let comments: Vec<String> = cmake_args.iter().map(|a| a.replace('\n', " ")).collect();
    context.insert("cmake_args", &comments);
    render(NODE_TEMPLATE_NAME, NODE_TEMPLATE, &context)
}

/// Render and write the initial-cache script of one node.
///
/// Any write failure is reported as [`GleanError::DescriptorWriteFailed`].
pub fn write_node(
    spec: &DependencySpec,
    entry: &CacheEntry,
    install_prefix: &std::path::Path,
    cmake_args: &[String],
) -> Result<()> {
    let content = render_node(spec, entry, install_prefix, cmake_args)?;
    atomic_write(&entry.descriptor_file, content.as_bytes()).map_err(|e| {
        GleanError::DescriptorWriteFailed {
            path: entry.descriptor_file.display().to_string(),
            reason: format!("{e:#}"),
        }
    })?;
    tracing::trace!("Wrote descriptor {}", entry.descriptor_file.display());
    Ok(())
}

/// One project of the export descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProject {
    /// ExternalProject target name
    pub project_name: String,
    /// Remote
    pub git_repo: String,
    /// Ref, `master` when unpinned
    pub git_tag: String,
    /// Whether submodules are cloned
    pub recurse_submodules: bool,
    /// Whether the project has its own `glean.json`
    pub has_glean: bool,
    /// Effective extra configure arguments
    pub cmake_args: Vec<String>,
    /// Targets that must be built first
    pub depends: Vec<String>,
}

impl ExportProject {
    /// Build an export entry, escaping every value.
    #[must_use]
    pub fn new(
        spec: &DependencySpec,
        has_glean: bool,
        cmake_args: &[String],
        depends: Vec<String>,
    ) -> Self {
        Self {
            project_name: spec.project_name.clone(),
            git_repo: cmake_escape(&spec.remote_uri),
            git_tag: cmake_escape(spec.reference().unwrap_or(DEFAULT_REF)),
            recurse_submodules: spec.recurse_submodules,
            has_glean,
            cmake_args: cmake_args.iter().map(|a| cmake_escape(a)).collect(),
            depends,
        }
    }
}

/// Render the export descriptor. `projects` must already be in build order.
pub fn render_export(projects: &[ExportProject], install_prefix: &std::path::Path) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("projects", projects);
    context.insert("install_directory", &cmake_escape(&install_prefix.display().to_string()));
    render(EXPORT_TEMPLATE_NAME, EXPORT_TEMPLATE, &context)
}
