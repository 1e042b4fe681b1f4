//! Locate command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn locate_prints_package_directory() {
  let env = TestEnv::new();

  env
    .depbuild_cmd()
    .arg("locate")
    .assert()
    .success()
    .stdout(format!("{}\n", env.library_dir().display()));
}

#[test]
fn locate_falls_back_to_recursive_search() {
  let env = TestEnv::new();
  std::fs::write(
    &env.config_path,
    "[dependency]\nlibdeps-dir = 'libdeps'\nenvironment = 'nucleo'\n",
  )
  .unwrap();

  env
    .depbuild_cmd()
    .arg("locate")
    .assert()
    .success()
    .stdout(predicate::str::contains("LibtropicArduino"));
}

#[test]
fn locate_unknown_package_fails() {
  let env = TestEnv::new();
  std::fs::write(
    &env.config_path,
    "[dependency]\nname = 'NotInstalled'\nlibdeps-dir = 'libdeps'\n",
  )
  .unwrap();

  env
    .depbuild_cmd()
    .arg("locate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("could not find installed library 'NotInstalled'"));
}

#[test]
fn environment_variable_supplies_libdeps_dir() {
  let env = TestEnv::new();
  std::fs::remove_file(&env.config_path).unwrap();

  env
    .depbuild_cmd()
    .arg("locate")
    .env("PROJECT_LIBDEPS_DIR", env.temp.path().join("libdeps"))
    .env("PIOENV", "esp32")
    .assert()
    .success()
    .stdout(format!("{}\n", env.library_dir().display()));
}
