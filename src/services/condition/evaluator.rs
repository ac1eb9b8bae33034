use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

use crate::error::{Error, Result};
use crate::game::cache::GameCache;
use crate::game::LoadOrderHandler;
use crate::metrics::Metrics;
use crate::models::{Message, PluginMetadata};
use crate::services::condition::parser::{self, Comparison, Expr, Function};
use crate::version::Version;

/// Evaluates parsed conditions against the installed game.
///
/// The evaluator borrows the game cache for the duration of one query; it
/// is the only component that touches the filesystem while a query runs.
/// Results are memoised by full condition string until the cache's
/// condition epoch ends. Missing files make predicates false; only genuine
/// I/O failures surface as errors.
pub struct ConditionEvaluator<'a> {
    data_path: &'a Utf8Path,
    cache: &'a mut GameCache,
    load_order: &'a dyn LoadOrderHandler,
    game_version: Option<&'a str>,
    metrics: &'a Metrics,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(
        data_path: &'a Utf8Path,
        cache: &'a mut GameCache,
        load_order: &'a dyn LoadOrderHandler,
        game_version: Option<&'a str>,
        metrics: &'a Metrics,
    ) -> Self {
        ConditionEvaluator {
            data_path,
            cache,
            load_order,
            game_version,
            metrics,
        }
    }

    /// Evaluate a condition string. Empty conditions are true.
    pub fn evaluate(&mut self, condition: &str) -> Result<bool> {
        let condition = condition.trim();
        if condition.is_empty() {
            return Ok(true);
        }
        if let Some(result) = self.cache.cached_condition(condition) {
            self.metrics.record_condition_cache_hit();
            return Ok(result);
        }
        self.metrics.record_condition_cache_miss();

        let ast = parser::parse(condition)?;
        let result = self.eval_expr(&ast)?;
        self.cache.cache_condition(condition, result);
        tracing::debug!("Evaluated condition \"{}\" to {}", condition, result);
        Ok(result)
    }

    /// True iff the message is visible: its condition holds or is absent.
    pub fn message_is_visible(&mut self, message: &Message) -> Result<bool> {
        match message.condition.as_deref() {
            Some(condition) => self.evaluate(condition),
            None => Ok(true),
        }
    }

    /// Resolve every conditional sub-value of a metadata entry: values
    /// whose condition fails are removed, dirty info is filtered by the
    /// loaded plugin's CRC, and condition strings are cleared on the
    /// returned copy.
    pub fn evaluate_all(&mut self, metadata: &PluginMetadata) -> Result<PluginMetadata> {
        let mut resolved = metadata.clone();

        self.retain_files(&mut resolved.load_after)?;
        self.retain_files(&mut resolved.requirements)?;
        self.retain_files(&mut resolved.incompatibilities)?;

        let mut messages = Vec::with_capacity(resolved.messages.len());
        for mut message in std::mem::take(&mut resolved.messages) {
            if self.message_is_visible(&message)? {
                message.condition = None;
                messages.push(message);
            }
        }
        resolved.messages = messages;

        let mut tags = Vec::with_capacity(resolved.tags.len());
        for mut tag in std::mem::take(&mut resolved.tags) {
            let keep = match tag.condition.as_deref() {
                Some(condition) => self.evaluate(condition)?,
                None => true,
            };
            if keep {
                tag.condition = None;
                tags.push(tag);
            }
        }
        resolved.tags = tags;

        let plugin_crc = self.cache.plugin(&metadata.name).map(|view| view.crc());
        resolved
            .dirty_info
            .retain(|dirty| plugin_crc == Some(dirty.crc));

        Ok(resolved)
    }

    fn retain_files(&mut self, files: &mut Vec<crate::models::FileRef>) -> Result<()> {
        let mut kept = Vec::with_capacity(files.len());
        for mut file in files.drain(..) {
            let keep = match file.condition.as_deref() {
                Some(condition) => self.evaluate(condition)?,
                None => true,
            };
            if keep {
                file.condition = None;
                kept.push(file);
            }
        }
        *files = kept;
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<bool> {
        match expr {
            Expr::And(lhs, rhs) => Ok(self.eval_expr(lhs)? && self.eval_expr(rhs)?),
            Expr::Or(lhs, rhs) => Ok(self.eval_expr(lhs)? || self.eval_expr(rhs)?),
            Expr::Not(inner) => Ok(!self.eval_expr(inner)?),
            Expr::Function(function) => self.eval_function(function),
        }
    }

    fn eval_function(&mut self, function: &Function) -> Result<bool> {
        match function {
            Function::FilePresent(name) => {
                if self.cache.plugin(name).is_some() {
                    return Ok(true);
                }
                Ok(self.data_path.join(name).exists())
            }
            Function::Active(name) => Ok(self.load_order.is_active(name)),
            Function::Many(pattern) => {
                let count = self.count_matching_files(pattern)?;
                Ok(count > 1)
            }
            Function::ManyActive(pattern) => {
                let regex = compile_filename_regex(pattern)?;
                let count = self
                    .load_order
                    .load_order()
                    .iter()
                    .filter(|name| self.load_order.is_active(name.as_str()))
                    .filter(|name| regex.is_match(name.as_str()))
                    .count();
                Ok(count > 1)
            }
            Function::IsMaster(name) => Ok(self
                .cache
                .plugin(name)
                .map(|view| view.is_master())
                .unwrap_or(false)),
            Function::Checksum(name, expected) => {
                if let Some(view) = self.cache.plugin(name) {
                    return Ok(view.crc() == *expected);
                }
                let path = self.data_path.join(name);
                match self.crc_of(&path)? {
                    Some(crc) => Ok(crc == *expected),
                    None => Ok(false),
                }
            }
            Function::Version {
                path,
                version,
                comparison,
            } => self.eval_version(path, version, *comparison),
        }
    }

    /// Version comparison target: the named plugin, or the game executable
    /// when the path is empty. Targets without a readable version compare
    /// as version zero; a missing plugin is simply false.
    fn eval_version(&mut self, path: &str, version: &str, comparison: Comparison) -> Result<bool> {
        let actual = if path.is_empty() {
            Version::parse(self.game_version.unwrap_or("0"))
        } else {
            match self.cache.plugin(path) {
                Some(view) => Version::parse(view.version().unwrap_or("0")),
                None => return Ok(false),
            }
        };
        let expected = Version::parse(version);

        let result = match comparison {
            Comparison::Eq => actual == expected,
            Comparison::Ne => actual != expected,
            Comparison::Lt => actual < expected,
            Comparison::Gt => actual > expected,
            Comparison::Le => actual <= expected,
            Comparison::Ge => actual >= expected,
        };
        Ok(result)
    }

    /// Count the files matching a `many()` pattern. The pattern splits at
    /// its last `/` into a literal parent directory and a filename regex
    /// that must match the whole name; the directory is not recursed.
    fn count_matching_files(&mut self, pattern: &str) -> Result<usize> {
        let (parent, name_pattern) = match pattern.rsplit_once('/') {
            Some((parent, name)) => (self.data_path.join(parent), name),
            None => (self.data_path.to_path_buf(), pattern),
        };
        let regex = compile_filename_regex(name_pattern)?;

        let entries = match fs::read_dir(&parent) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::io(&parent, &e)),
        };

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&parent, &e))?;
            let name = entry.file_name();
            if regex.is_match(&name.to_string_lossy()) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// CRC-32 of an arbitrary file under the data directory, memoised for
    /// the life of the game handle. None when the file does not exist.
    fn crc_of(&mut self, path: &Utf8PathBuf) -> Result<Option<u32>> {
        if let Some(crc) = self.cache.cached_crc(path) {
            return Ok(Some(crc));
        }
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, &e)),
        };
        let crc = crc32fast::hash(&bytes);
        self.cache.cache_crc(path, crc);
        Ok(Some(crc))
    }
}

/// Compile a condition regex so that it must match a whole filename,
/// case-insensitively. An invalid pattern is a condition syntax error.
fn compile_filename_regex(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i)^(?:{pattern})$")).map_err(|e| Error::ConditionSyntax {
        condition: pattern.to_string(),
        reason: format!("invalid regex: {e}"),
    })
}
