//! # File Filter Module
//!
//! This module contains components for filtering files based on ignore
//! patterns, file extensions and excluded path fragments.

use std::path::Path;

use anyhow::Result;

use crate::config::ExtensionConfig;
use crate::ignore::IgnoreManager;
use crate::verbose_log;

/// Result of a file filtering operation.
pub struct FilterResult {
  /// Whether the file should be processed
  pub should_process: bool,
  /// Reason why the file should not be processed (if any)
  pub reason: Option<String>,
}

impl FilterResult {
  /// Creates a new FilterResult indicating the file should be processed.
  pub const fn process() -> Self {
    Self {
      should_process: true,
      reason: None,
    }
  }

  /// Creates a new FilterResult indicating the file should be skipped.
  pub fn skip(reason: impl Into<String>) -> Self {
    Self {
      should_process: false,
      reason: Some(reason.into()),
    }
  }
}

/// Trait for components that filter files based on certain criteria.
pub trait FileFilter: Send + Sync {
  /// Determines whether a file should be processed.
  ///
  /// # Parameters
  ///
  /// * `path` - The path to the file to check
  ///
  /// # Returns
  ///
  /// A `FilterResult` indicating whether the file should be processed and why
  /// not if applicable.
  fn should_process(&self, path: &Path) -> Result<FilterResult>;
}

/// Filter that excludes files matching ignore patterns.
pub struct IgnoreFilter {
  ignore_manager: IgnoreManager,
}

impl IgnoreFilter {
  /// Creates a new IgnoreFilter from a list of ignore patterns.
  pub fn from_patterns(patterns: Vec<String>) -> Result<Self> {
    Ok(Self {
      ignore_manager: IgnoreManager::new(patterns)?,
    })
  }

  /// Returns a copy of this filter that also honors `.crtdebugignore` files
  /// between `dir` and `workspace_root`.
  pub fn with_ignore_files(&self, dir: &Path, workspace_root: &Path) -> Result<Self> {
    let mut ignore_manager = self.ignore_manager.clone();
    ignore_manager.load_ignore_files(dir, workspace_root)?;
    Ok(Self { ignore_manager })
  }
}

impl FileFilter for IgnoreFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    if self.ignore_manager.is_ignored(path) {
      Ok(FilterResult::skip("Matches ignore pattern"))
    } else {
      Ok(FilterResult::process())
    }
  }
}

/// Filter on the file extension, compared case-insensitively.
///
/// An empty include list admits every extension. Excludes always win over
/// includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilter {
  include: Vec<String>,
  exclude: Vec<String>,
}

fn normalize_extensions(extensions: impl IntoIterator<Item = String>) -> Vec<String> {
  extensions
    .into_iter()
    .map(|ext| ext.trim_start_matches('.').to_lowercase())
    .filter(|ext| !ext.is_empty())
    .collect()
}

impl ExtensionFilter {
  /// Creates a filter from the `[extensions]` config table.
  pub fn new(config: &ExtensionConfig) -> Self {
    Self::from_cli(config.include.clone(), config.exclude.clone())
  }

  /// Creates a filter from `--include-ext` / `--exclude-ext` values.
  pub fn from_cli(include: Vec<String>, exclude: Vec<String>) -> Self {
    Self {
      include: normalize_extensions(include),
      exclude: normalize_extensions(exclude),
    }
  }

  /// Applies command-line values on top of this filter.
  ///
  /// A non-empty CLI include list replaces the configured one; CLI excludes
  /// are added to the configured ones.
  pub fn merge_cli(mut self, include: Vec<String>, exclude: Vec<String>) -> Self {
    if !include.is_empty() {
      self.include = normalize_extensions(include);
    }
    self.exclude.extend(normalize_extensions(exclude));
    self
  }

  /// Returns `true` if this filter can reject anything.
  pub fn is_active(&self) -> bool {
    !self.include.is_empty() || !self.exclude.is_empty()
  }
}

impl FileFilter for ExtensionFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    let ext = path
      .extension()
      .map(|ext| ext.to_string_lossy().to_lowercase())
      .unwrap_or_default();

    if self.exclude.contains(&ext) {
      verbose_log!("Skipping: {} (extension '{}' is excluded)", path.display(), ext);
      return Ok(FilterResult::skip(format!("Extension '{}' is excluded", ext)));
    }

    if !self.include.is_empty() && !self.include.contains(&ext) {
      verbose_log!("Skipping: {} (extension '{}' is not included)", path.display(), ext);
      return Ok(FilterResult::skip(format!("Extension '{}' is not included", ext)));
    }

    Ok(FilterResult::process())
  }
}

/// Filter that rejects files whose path contains any of a set of fragments.
///
/// Matching is case-insensitive and runs against the path with `\` turned
/// into `/` and a leading `/` ensured, so `/tests/` excludes a top-level
/// `tests` directory as well as nested ones on every platform.
#[derive(Debug, Clone, Default)]
pub struct PathSubstringFilter {
  fragments: Vec<String>,
}

impl PathSubstringFilter {
  pub fn new(fragments: Vec<String>) -> Self {
    let fragments = fragments
      .into_iter()
      .map(|f| f.replace('\\', "/").to_lowercase())
      .filter(|f| !f.is_empty())
      .collect();
    Self { fragments }
  }
}

impl FileFilter for PathSubstringFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    let normalized = path.to_string_lossy().replace('\\', "/").to_lowercase();
    let haystack = format!("/{}", normalized.trim_start_matches('/'));

    match self.fragments.iter().find(|f| haystack.contains(f.as_str())) {
      Some(fragment) => {
        verbose_log!("Skipping: {} (path contains '{}')", path.display(), fragment);
        Ok(FilterResult::skip(format!("Path contains '{}'", fragment)))
      }
      None => Ok(FilterResult::process()),
    }
  }
}

/// Filter that combines multiple filters.
pub struct CompositeFilter {
  filters: Vec<Box<dyn FileFilter>>,
}

impl CompositeFilter {
  /// Creates a new CompositeFilter with the given filters.
  pub fn new(filters: Vec<Box<dyn FileFilter>>) -> Self {
    Self { filters }
  }

  /// Adds a filter to this CompositeFilter.
  pub fn add_filter(&mut self, filter: Box<dyn FileFilter>) {
    self.filters.push(filter);
  }
}

impl FileFilter for CompositeFilter {
  fn should_process(&self, path: &Path) -> Result<FilterResult> {
    for filter in &self.filters {
      let result = filter.should_process(path)?;
      if !result.should_process {
        return Ok(result);
      }
    }
    Ok(FilterResult::process())
  }
}

/// Constructs the filter chain used by the processor.
///
/// # Parameters
///
/// * `ignore_patterns` - Glob patterns for files to ignore
/// * `exclude_paths` - Path fragments that exclude a file
/// * `extension_filter` - Include/exclude rules on the file extension
pub fn create_default_filter(
  ignore_patterns: Vec<String>,
  exclude_paths: Vec<String>,
  extension_filter: ExtensionFilter,
) -> Result<CompositeFilter> {
  let mut composite = CompositeFilter::new(vec![Box::new(IgnoreFilter::from_patterns(ignore_patterns)?)]);

  if !exclude_paths.is_empty() {
    composite.add_filter(Box::new(PathSubstringFilter::new(exclude_paths)));
  }
  if extension_filter.is_active() {
    composite.add_filter(Box::new(extension_filter));
  }

  Ok(composite)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
  }

  #[test]
  fn test_ignore_filter() {
    let filter = IgnoreFilter::from_patterns(strings(&["*.bak", "tmp/*"])).unwrap();

    let result = filter.should_process(Path::new("src/main.cpp")).unwrap();
    assert!(result.should_process);

    let result = filter.should_process(Path::new("src/main.cpp.bak")).unwrap();
    assert!(!result.should_process);
    assert!(result.reason.is_some());
  }

  #[test]
  fn test_extension_filter_include() {
    let filter = ExtensionFilter::from_cli(strings(&["cpp", ".CXX"]), Vec::new());

    assert!(filter.should_process(Path::new("a/view.cpp")).unwrap().should_process);
    assert!(filter.should_process(Path::new("a/VIEW.CPP")).unwrap().should_process);
    assert!(filter.should_process(Path::new("a/doc.cxx")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("a/view.h")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("a/Makefile")).unwrap().should_process);
  }

  #[test]
  fn test_extension_filter_exclude_wins() {
    let filter = ExtensionFilter::from_cli(strings(&["cpp"]), strings(&["cpp"]));
    let result = filter.should_process(Path::new("x.cpp")).unwrap();
    assert!(!result.should_process);
    assert_eq!(result.reason.as_deref(), Some("Extension 'cpp' is excluded"));
  }

  #[test]
  fn test_extension_filter_empty_include_admits_all() {
    let filter = ExtensionFilter::from_cli(Vec::new(), strings(&["h"]));
    assert!(filter.should_process(Path::new("x.inl")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("x.h")).unwrap().should_process);
  }

  #[test]
  fn test_extension_filter_merge_cli() {
    let filter = ExtensionFilter::new(&ExtensionConfig::default()).merge_cli(strings(&["cc"]), strings(&["inl"]));
    assert!(filter.should_process(Path::new("x.cc")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("x.cpp")).unwrap().should_process);

    let kept = ExtensionFilter::new(&ExtensionConfig::default()).merge_cli(Vec::new(), Vec::new());
    assert!(kept.should_process(Path::new("x.cpp")).unwrap().should_process);
  }

  #[test]
  fn test_path_substring_filter() {
    let filter = PathSubstringFilter::new(strings(&["CommonCpp", r"\tests\", "stdafx"]));

    assert!(!filter.should_process(Path::new("src/commoncpp/a.cpp")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("proj/tests/a.cpp")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("tests/a.cpp")).unwrap().should_process);
    assert!(!filter.should_process(Path::new(r"proj\Tests\a.cpp")).unwrap().should_process);
    assert!(!filter.should_process(Path::new("proj/StdAfx.cpp")).unwrap().should_process);
    assert!(filter.should_process(Path::new("proj/testsuite.cpp")).unwrap().should_process);
  }

  #[test]
  fn test_composite_filter_stops_at_first_skip() {
    let filter = create_default_filter(
      strings(&["gen/"]),
      strings(&["interop"]),
      ExtensionFilter::from_cli(strings(&["cpp"]), Vec::new()),
    )
    .unwrap();

    assert!(filter.should_process(Path::new("src/view.cpp")).unwrap().should_process);

    let ignored = filter.should_process(Path::new("gen/view.cpp")).unwrap();
    assert_eq!(ignored.reason.as_deref(), Some("Matches ignore pattern"));

    let excluded = filter.should_process(Path::new("src/Interop/view.cpp")).unwrap();
    assert_eq!(excluded.reason.as_deref(), Some("Path contains 'interop'"));

    let wrong_ext = filter.should_process(Path::new("src/view.h")).unwrap();
    assert_eq!(wrong_ext.reason.as_deref(), Some("Extension 'h' is not included"));
  }
}
