//! Common test utilities

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Lay out a fix-file tree, templates and a staging spec for a run.
///
/// Returns the temp dir, the spec path and the working directory path.
pub fn create_run_fixture() -> (TempDir, PathBuf, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let data = root.join("fcst.run");
    let fix = root.join("fix");

    fs::create_dir_all(&fix).unwrap();
    write(&fix.join("global_hyblev.txt"), "levels\n");
    write(&fix.join("grid.tile1.nc"), "t1");
    write(&fix.join("grid.tile2.nc"), "t2");
    write(
        &root.join("model_configure.tmpl"),
        "npx: @[npx]\nquilting: @[quilting]\noutput_fh: @[output_fh]\n",
    );
    write(&root.join("diag_table.head"), "header\n");
    write(&root.join("diag_table.body"), "body\n");

    let spec_path = root.join("forecast.yaml");
    write(
        &spec_path,
        &format!(
            r#"
stage:
  mkdir:
    - $(DATA)/INPUT
    - $(DATA)/RESTART
  copy:
    - [{fix}/global_hyblev.txt, $(DATA)/global_hyblev.txt]
    - [{fix}/grid.tile*.nc, $(DATA)/INPUT]
tables:
  - dest: $(DATA)/diag_table
    fragments:
      - {root}/diag_table.head
      - {root}/diag_table.body
configure:
  - [{root}/model_configure.tmpl, $(DATA)/model_configure]
"#,
            fix = fix.display(),
            root = root.display()
        ),
    );

    (temp, spec_path, data)
}

/// Configuration pairs for a small gfs run in the given working directory
pub fn run_config_pairs(data: &Path) -> Vec<(String, String)> {
    [
        ("PDY", "20230101"),
        ("cyc", "0"),
        ("RUN", "gfs"),
        ("atm_res", "C48"),
        ("atm_levs", "128"),
        ("FHMIN", "0"),
        ("FHMAX", "24"),
        ("FHOUT", "6"),
        ("FHMAX_HF", "12"),
        ("FHOUT_HF", "3"),
        ("quilting", ".TRUE."),
        ("DOIAU", "NO"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .chain(std::iter::once((
        "DATA".to_string(),
        data.to_string_lossy().into_owned(),
    )))
    .collect()
}

pub fn write(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}
