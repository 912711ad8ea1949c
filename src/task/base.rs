//! Task lifecycle base
//!
//! A task is constructed from a configuration context, projects its
//! runtime context up front, and is then driven through its phases in
//! order by an external caller. Phases are no-ops by default; concrete
//! tasks override the subset they need.

use crate::config::{Config, ConfigValue, RuntimeContext};
use crate::error::{ConfigResult, Result};
use colored::Colorize;
use std::collections::HashMap;
use std::fmt;

/// The five ordered task phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Initialize,
    Configure,
    Execute,
    Finalize,
    Clean,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: &'static [Phase] = &[
        Phase::Initialize,
        Phase::Configure,
        Phase::Execute,
        Phase::Finalize,
        Phase::Clean,
    ];

    /// Phase name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::Configure => "configure",
            Phase::Execute => "execute",
            Phase::Finalize => "finalize",
            Phase::Clean => "clean",
        }
    }

    /// Parse a phase name
    pub fn from_name(name: &str) -> Option<Self> {
        Phase::ALL.iter().copied().find(|p| p.name() == name)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a task stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskState {
    Constructed,
    Initialized,
    Configured,
    Executed,
    Finalized,
    Cleaned,
}

impl TaskState {
    /// The state reached after a phase completes
    pub fn after(phase: Phase) -> Self {
        match phase {
            Phase::Initialize => TaskState::Initialized,
            Phase::Configure => TaskState::Configured,
            Phase::Execute => TaskState::Executed,
            Phase::Finalize => TaskState::Finalized,
            Phase::Clean => TaskState::Cleaned,
        }
    }

    /// Whether a phase is the next one in order from this state
    pub fn expects(&self, phase: Phase) -> bool {
        (*self as usize) == phase.index()
    }
}

/// Verbosity levels for status output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Explicit status reporting at phase boundaries
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    pub verbosity: Verbosity,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Reporter { verbosity }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".cyan(), message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red().bold(), message);
        }
    }

    /// Print a debug message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    /// Print a phase start message
    pub fn phase_start(&self, phase: Phase) {
        self.info(&format!("Running phase: {}", phase.to_string().green()));
    }

    /// Print a phase complete message
    pub fn phase_complete(&self, phase: Phase) {
        self.debug(&format!("Phase completed: {}", phase));
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Reporter::new(Verbosity::Normal)
    }
}

/// State every task carries: the captured configuration, the projected
/// runtime context, optional extension attributes and a reporter.
///
/// The configuration is never mutated after capture; phases only touch
/// the working directory tree.
#[derive(Debug)]
pub struct TaskBase {
    pub config: Config,
    pub runtime: RuntimeContext,
    pub extras: HashMap<String, ConfigValue>,
    pub reporter: Reporter,
    state: TaskState,
}

impl TaskBase {
    /// Capture a configuration and project the runtime context.
    ///
    /// Fails with `MissingRuntimeKey` if any required key is absent; no
    /// partially initialized task is ever produced.
    pub fn new(config: Config) -> ConfigResult<Self> {
        TaskBase::with_extras(config, HashMap::new())
    }

    /// Capture a configuration along with extension attributes
    pub fn with_extras(
        config: Config,
        extras: HashMap<String, ConfigValue>,
    ) -> ConfigResult<Self> {
        let runtime = RuntimeContext::from_config(&config)?;
        Ok(TaskBase {
            config,
            runtime,
            extras,
            reporter: Reporter::default(),
            state: TaskState::Constructed,
        })
    }

    /// Set the reporter verbosity
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.reporter = Reporter::new(verbosity);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Record a completed phase.
    ///
    /// Out-of-order invocation is rejected in debug builds only; release
    /// builds leave ordering to the caller.
    pub fn mark(&mut self, phase: Phase) {
        debug_assert!(
            self.state.expects(phase),
            "phase '{}' invoked out of order from state {:?}",
            phase,
            self.state
        );
        self.state = TaskState::after(phase);
    }
}

/// The task lifecycle interface.
///
/// Each phase defaults to a no-op. Phases are idempotent only within a
/// single task instance's lifetime; re-invoking a phase is undefined
/// unless the task documents otherwise.
pub trait Lifecycle {
    fn base(&self) -> &TaskBase;
    fn base_mut(&mut self) -> &mut TaskBase;

    /// Prepare the working directory and stage inputs
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render model-control files in preparation for execution
    fn configure(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run the model (extension point)
    fn execute(&mut self) -> Result<()> {
        Ok(())
    }

    /// Collect output after execution (extension point)
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Clean up after finalization
    fn clean(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Run a single phase and record it
pub fn run_phase(task: &mut dyn Lifecycle, phase: Phase) -> Result<()> {
    let reporter = task.base().reporter;
    reporter.phase_start(phase);

    let result = match phase {
        Phase::Initialize => task.initialize(),
        Phase::Configure => task.configure(),
        Phase::Execute => task.execute(),
        Phase::Finalize => task.finalize(),
        Phase::Clean => task.clean(),
    };

    if let Err(e) = result {
        reporter.error(&format!("Phase '{}' failed: {}", phase, e));
        return Err(e);
    }

    task.base_mut().mark(phase);
    reporter.phase_complete(phase);
    Ok(())
}

/// Drive phases strictly in order, up to and including `through`.
///
/// A failing phase terminates the task before its next phase runs.
pub fn run_phases(task: &mut dyn Lifecycle, through: Phase) -> Result<()> {
    for &phase in Phase::ALL {
        run_phase(task, phase)?;
        if phase == through {
            break;
        }
    }
    Ok(())
}
