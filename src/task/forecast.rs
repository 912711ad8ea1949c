//! The forecast preparation task
//!
//! Resolves a declarative staging spec against the run configuration,
//! materializes the working directory, and renders the model-control
//! files. Launching the model itself belongs to the external runner.

use crate::config::{load_yaml_file, Config, ConfigValue};
use crate::engine::schedule::output_hours;
use crate::engine::stage::{make_directory, sync, Manifest, SyncMode};
use crate::engine::template::{substitute, substitute_str, DelimiterStyle, Layered, ValueFormat};
use crate::error::{ConfigError, Result};
use crate::task::base::{Lifecycle, TaskBase, Verbosity};
use crate::task::model::{restart_cadence, AtmGrid};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// The declarative spec a forecast task is driven by.
///
/// Loaded from YAML and resolved with `$(NAME)` placeholders before
/// deserialization, so every path below is concrete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastSpec {
    /// Filesystem staging manifest
    #[serde(default)]
    pub stage: Manifest,

    /// Table files assembled by concatenating fragments
    #[serde(default)]
    pub tables: Vec<TableSpec>,

    /// `[template, destination]` model-control files rendered with
    /// `@[NAME]` placeholders
    #[serde(default)]
    pub configure: Vec<(PathBuf, PathBuf)>,
}

/// One concatenated table file
#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub dest: PathBuf,
    pub fragments: Vec<PathBuf>,
}

/// Forecast model run preparation task
pub struct ForecastTask {
    base: TaskBase,
    spec_path: PathBuf,
    spec: Option<ForecastSpec>,
    derived: HashMap<String, ConfigValue>,
}

impl ForecastTask {
    /// Construct the task from a configuration and a staging spec path
    pub fn new(config: Config, spec_path: PathBuf) -> Result<Self> {
        let base = TaskBase::new(config)?;
        Ok(ForecastTask {
            base,
            spec_path,
            spec: None,
            derived: HashMap::new(),
        })
    }

    /// Set the reporter verbosity
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.base = self.base.with_verbosity(verbosity);
        self
    }

    /// The resolved staging spec, once `initialize` has run
    pub fn spec(&self) -> Option<&ForecastSpec> {
        self.spec.as_ref()
    }

    /// Derived resolver values exposed to templates
    pub fn derived(&self) -> &HashMap<String, ConfigValue> {
        &self.derived
    }

    fn derive_grid(&mut self) -> Result<()> {
        let res = self.base.config.str_or("atm_res", "C48");
        let levs = self.base.config.int_or("atm_levs", 128)?;
        let grid = AtmGrid::derive(&res, levs)?;

        self.derived
            .insert("atm_res".to_string(), ConfigValue::Str(grid.res.clone()));
        self.derived
            .insert("ntiles".to_string(), ConfigValue::Int(grid.ntiles));
        self.derived
            .insert("jcap".to_string(), ConfigValue::Int(grid.jcap));
        self.derived
            .insert("lonb".to_string(), ConfigValue::Int(grid.lonb));
        self.derived
            .insert("latb".to_string(), ConfigValue::Int(grid.latb));
        self.derived
            .insert("npx".to_string(), ConfigValue::Int(grid.npx));
        self.derived
            .insert("npy".to_string(), ConfigValue::Int(grid.npy));
        self.derived
            .insert("npz".to_string(), ConfigValue::Int(grid.npz));
        Ok(())
    }

    fn derive_schedules(&mut self) -> Result<()> {
        let cfg = &self.base.config;
        let fhmin = cfg.int_or("FHMIN", 0)?;
        let fhmax = cfg.int_or("FHMAX", 120)?;
        let fhout = cfg.int_or("FHOUT", 6)?;
        let fhmax_hf = cfg.int_or("FHMAX_HF", 0)?;
        let fhout_hf = cfg.int_or("FHOUT_HF", 1)?;

        let output = output_hours(fhmin, fhmax_hf, fhout_hf, fhmax, fhout)?;
        let restart = restart_cadence(&self.base.runtime.run, cfg)?;

        self.derived
            .insert("output_fh".to_string(), ConfigValue::Str(join(&output)));
        self.derived
            .insert("restart_fh".to_string(), ConfigValue::Str(join(&restart)));
        Ok(())
    }

    fn loaded_spec(&self) -> Result<&ForecastSpec> {
        self.spec.as_ref().ok_or_else(|| {
            ConfigError::Invalid("forecast task was configured before initialization".to_string())
                .into()
        })
    }
}

fn join(hours: &[i64]) -> String {
    hours
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Lifecycle for ForecastTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TaskBase {
        &mut self.base
    }

    /// Resolve the staging spec and materialize the working directory
    fn initialize(&mut self) -> Result<()> {
        self.derive_grid()?;

        let doc = load_yaml_file(&self.spec_path)?;
        let resolved = {
            let resolver = Layered {
                over: &self.derived,
                under: &self.base.config,
            };
            substitute(
                &doc,
                DelimiterStyle::DollarParen,
                &resolver,
                &ValueFormat::default(),
            )?
        };
        let spec: ForecastSpec = serde_yaml::from_value(resolved)?;

        self.base.reporter.debug(&format!(
            "Staging {} manifest entries into {}",
            spec.stage.len(),
            self.base.runtime.data.display()
        ));
        sync(&spec.stage, SyncMode::ContinueOnError)?;

        self.spec = Some(spec);
        Ok(())
    }

    /// Render model-control files and assemble table files
    fn configure(&mut self) -> Result<()> {
        self.derive_schedules()?;

        let spec = self.loaded_spec()?.clone();
        let resolver = Layered {
            over: &self.derived,
            under: &self.base.config,
        };
        let format = ValueFormat::default();

        for (template, dest) in &spec.configure {
            let text = fs::read_to_string(template)?;
            let rendered = substitute_str(&text, DelimiterStyle::AtSquare, &resolver, &format)?;
            if let Some(parent) = dest.parent() {
                make_directory(parent)?;
            }
            fs::write(dest, rendered)?;
            self.base
                .reporter
                .debug(&format!("Rendered {}", dest.display()));
        }

        for table in &spec.tables {
            let mut assembled = String::new();
            for fragment in &table.fragments {
                assembled.push_str(&fs::read_to_string(fragment)?);
            }
            if let Some(parent) = table.dest.parent() {
                make_directory(parent)?;
            }
            fs::write(&table.dest, assembled)?;
            self.base
                .reporter
                .debug(&format!("Assembled {}", table.dest.display()));
        }

        Ok(())
    }

    /// The model binary is launched by the external task runner
    fn execute(&mut self) -> Result<()> {
        self.base
            .reporter
            .info("Model execution is delegated to the external runner");
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.base.reporter.debug("Nothing to finalize");
        Ok(())
    }

    /// Remove the working directory unless `KEEPDATA` asks to keep it
    fn clean(&mut self) -> Result<()> {
        if self.base.config.bool_or("KEEPDATA", true)? {
            self.base.reporter.debug("KEEPDATA set, keeping working directory");
            return Ok(());
        }

        let data = &self.base.runtime.data;
        if data.exists() {
            fs::remove_dir_all(data)?;
            self.base
                .reporter
                .info(&format!("Removed working directory {}", data.display()));
        }
        Ok(())
    }
}
