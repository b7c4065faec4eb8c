//! output targets
//!
//! a target decides how rendered members are packaged. the pipeline drives
//! it with lifecycle calls and never inspects what it produces.

use super::{GenerationInfo, Phase};
use crate::error::{Error, Result};
use crate::naming;
use std::collections::HashSet;
use std::fmt::Write as _;

const HEADER: &str = "//! generated by gqlforge. do not edit.";
const ALLOW: &str =
    "allow(dead_code, unused_imports, non_camel_case_types, non_snake_case, clippy::all)";

/// sink for generated members
pub trait OutputTarget {
    fn before_generation(&mut self, info: &GenerationInfo) -> Result<()>;

    fn before_phase(&mut self, phase: Phase) -> Result<()>;

    /// start a member named after its main item
    fn begin_member(&mut self, name: &str) -> Result<()>;

    fn write(&mut self, text: &str) -> Result<()>;

    fn end_member(&mut self) -> Result<()>;

    fn after_phase(&mut self, phase: Phase) -> Result<()>;

    fn after_generation(&mut self) -> Result<()>;
}

/// every member in one module of one text
#[derive(Debug, Default)]
pub struct SingleStreamTarget {
    out: String,
    nullable_references: bool,
    members_in_phase: usize,
}

impl SingleStreamTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_output(self) -> String {
        self.out
    }
}

impl OutputTarget for SingleStreamTarget {
    fn before_generation(&mut self, info: &GenerationInfo) -> Result<()> {
        self.out.clear();
        self.nullable_references = info.nullable_references;
        writeln!(self.out, "{HEADER}")?;
        writeln!(self.out)?;
        writeln!(self.out, "pub mod {} {{", info.namespace)?;
        writeln!(self.out, "#![{ALLOW}]")?;
        Ok(())
    }

    fn before_phase(&mut self, phase: Phase) -> Result<()> {
        writeln!(self.out)?;
        if self.nullable_references && phase.uses_nullable_references() {
            writeln!(self.out, "// region {} (nullable references)", phase.label())?;
        } else {
            writeln!(self.out, "// region {}", phase.label())?;
        }
        self.members_in_phase = 0;
        Ok(())
    }

    fn begin_member(&mut self, _name: &str) -> Result<()> {
        writeln!(self.out)?;
        self.members_in_phase += 1;
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.out.push_str(text);
        Ok(())
    }

    fn end_member(&mut self) -> Result<()> {
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        Ok(())
    }

    fn after_phase(&mut self, phase: Phase) -> Result<()> {
        if self.members_in_phase > 0 {
            writeln!(self.out)?;
        }
        writeln!(self.out, "// endregion {}", phase.label())?;
        Ok(())
    }

    fn after_generation(&mut self) -> Result<()> {
        writeln!(self.out, "}}")?;
        Ok(())
    }
}

/// one produced file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// path relative to the output directory
    pub name: String,
    pub content: String,
}

/// name and byte length of a produced file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size: usize,
}

/// files of a multi-file run, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub files: Vec<GeneratedFile>,
}

impl GeneratedFiles {
    pub fn manifest(&self) -> Vec<FileDescriptor> {
        self.files
            .iter()
            .map(|file| FileDescriptor {
                name: file.name.clone(),
                size: file.content.len(),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|file| file.name == name)
    }
}

/// one source file per member plus a `lib.rs` tying them together
#[derive(Debug, Default)]
pub struct MultiFileTarget {
    info: Option<GenerationInfo>,
    modules: Vec<String>,
    used: HashSet<String>,
    current: Option<(String, String)>,
    files: Vec<GeneratedFile>,
}

impl MultiFileTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_output(self) -> GeneratedFiles {
        GeneratedFiles { files: self.files }
    }

    fn unique_module(&mut self, name: &str) -> String {
        let base = naming::module_name(name);
        let mut module = base.clone();
        let mut n = 2;
        while !self.used.insert(module.clone()) {
            module = format!("{}_{n}", base.trim_end_matches('_'));
            n += 1;
        }
        module
    }

    fn lib_file(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "{HEADER}")?;
        writeln!(out)?;
        writeln!(out, "#![{ALLOW}]")?;
        writeln!(out)?;
        for module in &self.modules {
            writeln!(out, "mod {module};")?;
        }
        writeln!(out)?;
        for module in &self.modules {
            writeln!(out, "pub use {module}::*;")?;
        }
        Ok(out)
    }

    fn manifest_file(info: &GenerationInfo, crate_name: &str) -> Result<String> {
        let runtime = info.runtime_dependency.as_deref().unwrap_or("\"0.1\"");
        let mut out = String::new();
        writeln!(out, "[package]")?;
        writeln!(out, "name = {}", naming::string_literal(crate_name))?;
        writeln!(out, "version = \"0.1.0\"")?;
        writeln!(out, "edition = \"2021\"")?;
        writeln!(out)?;
        writeln!(out, "[dependencies]")?;
        writeln!(out, "gqlforge = {runtime}")?;
        writeln!(out, "serde = {{ version = \"1\", features = [\"derive\"] }}")?;
        writeln!(out, "serde_json = \"1\"")?;
        writeln!(out, "chrono = {{ version = \"0.4\", features = [\"serde\"] }}")?;
        writeln!(out, "uuid = {{ version = \"1\", features = [\"serde\"] }}")?;
        writeln!(out, "rust_decimal = {{ version = \"1\", features = [\"serde\"] }}")?;
        Ok(out)
    }
}

impl OutputTarget for MultiFileTarget {
    fn before_generation(&mut self, info: &GenerationInfo) -> Result<()> {
        *self = Self::default();
        self.info = Some(info.clone());
        // reserved by the crate root
        self.used.insert("lib".to_string());
        Ok(())
    }

    fn before_phase(&mut self, _phase: Phase) -> Result<()> {
        Ok(())
    }

    fn begin_member(&mut self, name: &str) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::Config(format!(
                "member `{name}` started before the previous member ended"
            )));
        }
        let module = self.unique_module(name);
        self.current = Some((module, "use super::*;\n\n".to_string()));
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        match &mut self.current {
            Some((_, content)) => {
                content.push_str(text);
                Ok(())
            }
            None => Err(Error::Config("write outside of a member".to_string())),
        }
    }

    fn end_member(&mut self) -> Result<()> {
        let Some((module, mut content)) = self.current.take() else {
            return Err(Error::Config("member ended twice".to_string()));
        };
        if !content.ends_with('\n') {
            content.push('\n');
        }
        self.files.push(GeneratedFile {
            name: format!("src/{module}.rs"),
            content,
        });
        self.modules.push(module);
        Ok(())
    }

    fn after_phase(&mut self, _phase: Phase) -> Result<()> {
        Ok(())
    }

    fn after_generation(&mut self) -> Result<()> {
        let lib = self.lib_file()?;
        self.files.push(GeneratedFile {
            name: "src/lib.rs".to_string(),
            content: lib,
        });
        if let Some(info) = &self.info {
            if let Some(crate_name) = &info.crate_name {
                let manifest = Self::manifest_file(info, crate_name)?;
                self.files.push(GeneratedFile {
                    name: "Cargo.toml".to_string(),
                    content: manifest,
                });
            }
        }
        Ok(())
    }
}
