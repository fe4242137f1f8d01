//! Build script for tickplay
//!
//! Handles:
//! 1. NAPI-RS setup (feature `node`)
//! 2. Compiling the C accessor library via `cc` (feature `ffmpeg`)
//! 3. Linking the FFmpeg demux/decode libraries (feature `ffmpeg`)

use std::env;
use std::path::{Path, PathBuf};

/// FFmpeg libraries in link order (dependents first)
const FFMPEG_LIBS: [&str; 5] = ["avformat", "avcodec", "swscale", "swresample", "avutil"];

fn main() {
  println!("cargo:rerun-if-changed=build.rs");

  if env::var_os("CARGO_FEATURE_NODE").is_some() {
    // NAPI-RS build setup
    napi_build::setup();
  }

  if env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
    return;
  }

  // Get target information
  let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

  // Get FFmpeg directory
  let ffmpeg_dir = get_ffmpeg_dir(&target_os);

  // Compile C accessor library
  compile_accessors(&ffmpeg_dir, &target_os);

  // Link FFmpeg libraries
  link_ffmpeg(&ffmpeg_dir, &target_os);

  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
}

/// Get FFmpeg installation directory
fn get_ffmpeg_dir(target_os: &str) -> PathBuf {
  // Check for custom FFMPEG_DIR environment variable
  if let Ok(dir) = env::var("FFMPEG_DIR") {
    return PathBuf::from(dir);
  }

  // Check for pkg-config on Unix systems
  #[cfg(unix)]
  {
    if let Ok(output) = std::process::Command::new("pkg-config")
      .args(["--variable=prefix", "libavformat"])
      .output()
    {
      if output.status.success() {
        let prefix = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(prefix.trim());
        if path.exists() {
          return path;
        }
      }
    }
  }

  // Try common installation paths
  let common_paths = match target_os {
    "macos" => vec!["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => vec!["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => vec!["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => vec![],
  };

  for path in common_paths {
    let p = PathBuf::from(path);
    if p.join("include/libavformat/avformat.h").exists() {
      return p;
    }
  }

  println!(
    "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
  );
  PathBuf::from("/usr/local")
}

/// Compile the C accessor library
fn compile_accessors(ffmpeg_dir: &Path, target_os: &str) {
  let mut build = cc::Build::new();
  build
    .file("src/ffi/accessors.c")
    .include(ffmpeg_dir.join("include"))
    .warnings(true)
    .extra_warnings(true);

  if target_os == "macos" {
    build.flag("-Wno-deprecated-declarations");
  }

  build.compile("tickplay_accessors");
}

/// Link FFmpeg, statically when every archive is present
fn link_ffmpeg(ffmpeg_dir: &Path, target_os: &str) {
  let lib_dir = find_lib_dir(ffmpeg_dir);
  println!("cargo:rustc-link-search=native={}", lib_dir.display());

  let all_static = FFMPEG_LIBS
    .iter()
    .all(|lib| lib_dir.join(format!("lib{}.a", lib)).exists());

  if all_static {
    for lib in &FFMPEG_LIBS {
      // Full path forces the archive over a shared library of the same name
      println!(
        "cargo:rustc-link-arg={}",
        lib_dir.join(format!("lib{}.a", lib)).display()
      );
    }
    link_static_codec_libraries(target_os);
    link_platform_libraries(target_os);
  } else {
    for lib in &FFMPEG_LIBS {
      println!("cargo:rustc-link-lib=dylib={}", lib);
    }
  }
}

/// `lib/` or a multiarch subdirectory that holds libavformat
fn find_lib_dir(ffmpeg_dir: &Path) -> PathBuf {
  let candidates = [
    ffmpeg_dir.join("lib"),
    ffmpeg_dir.join("lib64"),
    ffmpeg_dir.join("lib/x86_64-linux-gnu"),
    ffmpeg_dir.join("lib/aarch64-linux-gnu"),
  ];
  candidates
    .iter()
    .find(|dir| {
      dir.join("libavformat.a").exists()
        || dir.join("libavformat.so").exists()
        || dir.join("libavformat.dylib").exists()
        || dir.join("avformat.lib").exists()
    })
    .cloned()
    .unwrap_or_else(|| ffmpeg_dir.join("lib"))
}

/// Third-party decoders a static FFmpeg build may depend on
fn link_static_codec_libraries(target_os: &str) {
  let search_paths = get_codec_library_paths(target_os);
  let optional = ["dav1d", "vpx", "opus", "vorbis", "ogg", "mp3lame", "soxr", "zimg"];

  for lib in &optional {
    if let Some(path) = find_static_lib_path(lib, &search_paths) {
      println!("cargo:rustc-link-arg={}", path.display());
    }
  }
}

/// Get codec library search paths
fn get_codec_library_paths(target_os: &str) -> Vec<PathBuf> {
  let mut paths = Vec::new();

  if let Ok(lib_path) = env::var("LIBRARY_PATH") {
    for path in lib_path.split(':') {
      paths.push(PathBuf::from(path));
    }
  }

  match target_os {
    "macos" => {
      paths.push(PathBuf::from("/opt/homebrew/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
    }
    "linux" => {
      paths.push(PathBuf::from("/usr/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/usr/lib/x86_64-linux-gnu"));
      paths.push(PathBuf::from("/usr/lib/aarch64-linux-gnu"));
    }
    _ => {}
  }

  if let Ok(ffmpeg_dir) = env::var("FFMPEG_DIR") {
    paths.push(PathBuf::from(ffmpeg_dir).join("lib"));
  }

  paths
}

/// Find static library path if it exists
fn find_static_lib_path(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
  let static_name = format!("lib{}.a", name);
  paths
    .iter()
    .map(|path| path.join(&static_name))
    .find(|full_path| full_path.exists())
}

/// Link platform-specific system libraries for a static FFmpeg
fn link_platform_libraries(target_os: &str) {
  match target_os {
    "macos" => {
      for framework in ["CoreFoundation", "CoreMedia", "CoreVideo", "Security", "AudioToolbox"] {
        println!("cargo:rustc-link-lib=framework={}", framework);
      }
      println!("cargo:rustc-link-lib=bz2");
      println!("cargo:rustc-link-lib=iconv");
      println!("cargo:rustc-link-lib=lzma");
    }

    "linux" => {
      // zlib comes from libz-sys
      println!("cargo:rustc-link-lib=m");
      println!("cargo:rustc-link-lib=pthread");
      println!("cargo:rustc-link-lib=dl");
    }

    "windows" => {
      for lib in ["bcrypt", "ole32", "user32", "ws2_32", "secur32", "advapi32"] {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }

    _ => {
      println!("cargo:warning=Unknown target OS: {}", target_os);
    }
  }
}
