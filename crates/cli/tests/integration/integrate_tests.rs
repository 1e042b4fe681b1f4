//! Integrate command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn json_output(env: &TestEnv) -> serde_json::Value {
  let output = env
    .depbuild_cmd()
    .args(["integrate", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn integrate_reuses_prebuilt_artifact() {
  let env = TestEnv::new();
  env.prebuilt("-DLT_HELPERS");

  env
    .depbuild_cmd()
    .arg("integrate")
    .assert()
    .success()
    .stdout(predicate::str::contains("Reused"))
    .stdout(predicate::str::contains("-ltropic"))
    .stdout(predicate::str::contains("-DLT_HELPERS"));
}

#[test]
fn integrate_json_reports_environment() {
  let env = TestEnv::new();
  env.prebuilt("-DLT_HELPERS -DLT_USE_TREZOR_CRYPTO");

  let json = json_output(&env);

  assert_eq!(json["report"]["cached"], true);
  assert_eq!(json["report"]["library_name"], "tropic");
  assert_eq!(json["environment"]["primary"]["libs"], serde_json::json!(["tropic"]));
  assert_eq!(
    json["environment"]["project"]["defines"],
    serde_json::json!(["LT_HELPERS", "LT_USE_TREZOR_CRYPTO"])
  );
  assert_eq!(json["environment"]["source_groups"][0]["name"], "lib_tropic_hal");
  assert_eq!(json["environment"]["journal"][0]["op"], "process_flags");
}

#[test]
fn integrate_cargo_prints_link_directives() {
  let env = TestEnv::new();
  env.prebuilt("-DLT_HELPERS");

  env
    .depbuild_cmd()
    .args(["integrate", "--format", "cargo"])
    .assert()
    .success()
    .stdout(predicate::str::contains(format!(
      "cargo:rustc-link-search=native={}",
      env.build_dir().display()
    )))
    .stdout(predicate::str::contains("cargo:rustc-link-lib=static=tropic"))
    .stdout(predicate::str::contains("cargo:defines=LT_HELPERS"));
}

#[test]
fn integrate_without_hal_sources_fails() {
  let env = TestEnv::new();
  env.prebuilt("-DLT_HELPERS");
  std::fs::remove_dir_all(env.library_dir().join("libtropic/hal/port/arduino")).unwrap();
  env.write_file("libdeps/esp32/LibtropicArduino/libtropic/hal/port/arduino/README.md", "");

  env
    .depbuild_cmd()
    .arg("integrate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no HAL sources found"));
}

#[test]
fn integrate_with_malformed_manifest_fails() {
  let env = TestEnv::new();
  env.prebuilt("-DLT_HELPERS");
  env.write_config("[build]\nmetadata-pass = true\n");
  env.write_file(
    "libdeps/esp32/LibtropicArduino/libtropic_build_meta/lt_sources.json",
    r#"{"hal_sources": "not-a-list"}"#,
  );

  env
    .depbuild_cmd()
    .arg("integrate")
    .assert()
    .failure()
    .stderr(predicate::str::contains("malformed build metadata"));
}

#[cfg(unix)]
mod with_fake_cmake {
  use predicates::prelude::*;

  use super::super::common::{TestEnv, install_fake_cmake};

  #[test]
  fn integrate_runs_configure_then_build() {
    let env = TestEnv::new();
    let cmake = install_fake_cmake(&env, 0);
    env.write_config(&format!(
      "[build]\ncmake = '{}'\noptions = ['-DLT_BUILD_TESTS=OFF']\n",
      cmake.display()
    ));

    env
      .depbuild_cmd()
      .arg("integrate")
      .env("CC", "xtensa-esp32-elf-gcc")
      .assert()
      .success()
      .stdout(predicate::str::contains("Built"));

    let log = std::fs::read_to_string(env.temp.path().join("cmake.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("-S "));
    assert!(lines[0].contains("-DCMAKE_C_COMPILER=xtensa-esp32-elf-gcc"));
    assert!(lines[0].ends_with("-DLT_BUILD_TESTS=OFF"));
    assert!(lines[1].starts_with("--build "));
    assert!(lines[1].ends_with("--target tropic"));
  }

  #[test]
  fn second_integrate_skips_cmake() {
    let env = TestEnv::new();
    let cmake = install_fake_cmake(&env, 0);
    env.write_config(&format!("[build]\ncmake = '{}'\n", cmake.display()));

    for _ in 0..2 {
      env.depbuild_cmd().arg("integrate").assert().success();
    }

    let log = std::fs::read_to_string(env.temp.path().join("cmake.log")).unwrap();
    assert_eq!(log.lines().count(), 2);
  }

  #[test]
  fn config_hash_rebuilds_when_options_change() {
    let env = TestEnv::new();
    let cmake = install_fake_cmake(&env, 0);
    let config = |options: &str| {
      format!(
        "[build]\ncmake = '{}'\ncache = 'config-hash'\noptions = '{}'\n",
        cmake.display(),
        options
      )
    };

    env.write_config(&config("-DLT_HELPERS=ON"));
    env.depbuild_cmd().arg("integrate").assert().success();
    env.depbuild_cmd().arg("integrate").assert().success();

    env.write_config(&config("-DLT_HELPERS=OFF"));
    env
      .depbuild_cmd()
      .arg("integrate")
      .assert()
      .success()
      .stdout(predicate::str::contains("Built"));

    let log = std::fs::read_to_string(env.temp.path().join("cmake.log")).unwrap();
    assert_eq!(log.lines().count(), 4);
  }

  #[test]
  fn defines_only_forwarding_drops_generic_tokens() {
    let env = TestEnv::new();
    let cmake = install_fake_cmake(&env, 0);
    env.write_config(&format!(
      "[build]\ncmake = '{}'\nforwarding = 'defines-only'\n",
      cmake.display()
    ));

    env
      .depbuild_cmd()
      .arg("integrate")
      .env("DEPBUILD_BUILD_FLAGS", "-DHOST_DEFINE -Wall")
      .assert()
      .success();

    let log = std::fs::read_to_string(env.temp.path().join("cmake.log")).unwrap();
    let configure = log.lines().next().unwrap();
    assert!(configure.contains("-DHOST_DEFINE"));
    assert!(configure.contains("-DCMAKE_SYSTEM_NAME=Generic"));
    assert!(!configure.contains("-Wall"));
  }

  #[test]
  fn failing_cmake_aborts_integration() {
    let env = TestEnv::new();
    let cmake = install_fake_cmake(&env, 2);
    env.write_config(&format!("[build]\ncmake = '{}'\n", cmake.display()));

    env
      .depbuild_cmd()
      .arg("integrate")
      .assert()
      .failure()
      .stderr(predicate::str::contains("exit code 2"));

    let log = std::fs::read_to_string(env.temp.path().join("cmake.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
  }
}
