/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILENAME: &str = "depbuild.toml";

/// Directory name of the installed package inside the libdeps tree.
pub const DEFAULT_LIB_NAME: &str = "LibtropicArduino";

/// CMake target producing the static library.
pub const DEFAULT_BUILD_TARGET: &str = "tropic";

/// CMake target that emits the source manifest during the metadata pass.
pub const DEFAULT_METADATA_TARGET: &str = "lt_sources_manifest";

// Layout, relative to the installed package directory.
pub const DEFAULT_SUBROOT: &str = "libtropic";
pub const DEFAULT_BUILD_DIR: &str = "libtropic_build";
pub const DEFAULT_METADATA_DIR: &str = "libtropic_build_meta";

// Relative to the metadata build directory.
pub const DEFAULT_MANIFEST: &str = "lt_sources.json";

// Relative to the build directory.
pub const DEFAULT_ARTIFACT: &str = "libtropic.a";

// Relative to the native subroot.
pub const DEFAULT_HAL_PORT_DIR: &str = "hal/port/arduino";

pub const DEFAULT_CMAKE: &str = "cmake";

/// Stamp written next to the artifact by the `config-hash` cache policy.
pub const STAMP_FILENAME: &str = ".depbuild-stamp";

/// Source file extensions picked up when scanning a HAL port directory.
pub const HAL_SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc"];

/// Defines always forwarded to CMake under the `defines-only` policy.
pub const BUILTIN_DEFINES: &[&str] = &[
  "-DCMAKE_SYSTEM_NAME=Generic",
  "-DCMAKE_TRY_COMPILE_TARGET_TYPE=STATIC_LIBRARY",
];
