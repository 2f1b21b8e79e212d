use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

const CRATE_NAME: &str = "ancestor_expander";
const PEDIGREE_MATCH: &str = "https://www.familysearch.org/*/tree/pedigree/*";

fn main() {
    if let Err(e) = build() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn build() -> io::Result<()> {
    println!("🚀 Building Ancestor Expander extension bundle...");

    // 1. wasm-pack でビルド（ライブラリのみ、content scriptから読み込む）
    println!("📦 Running wasm-pack build...");
    let status = Command::new("wasm-pack")
        .env("CARGO_INCREMENTAL", "1")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "pkg",
            "--no-default-features",
            "--features",
            "wasm",
        ])
        .status()?;

    if !status.success() {
        return Err(io::Error::other("wasm-pack build failed"));
    }

    println!("✅ WASM build completed");

    let pkg_dir = Path::new("pkg");

    // 2. 拡張機能のマニフェストとローダーを生成
    println!("📝 Generating extension files...");
    fs::write(pkg_dir.join("manifest.json"), manifest())?;
    fs::write(pkg_dir.join("content.js"), loader())?;

    println!("✅ Extension files generated:");
    println!("   - pkg/manifest.json");
    println!("   - pkg/content.js");

    println!("\n🎉 Build complete! To try it:");
    println!("   Load the pkg/ directory as an unpacked extension");
    println!("   Then open a FamilySearch pedigree page");
    Ok(())
}

fn manifest() -> String {
    format!(
        r#"{{
  "manifest_version": 3,
  "name": "Ancestor Expander",
  "version": "{version}",
  "description": "Expands ancestors on the FamilySearch pedigree view automatically.",
  "content_scripts": [
    {{
      "matches": ["{matches}"],
      "js": ["content.js"],
      "run_at": "document_idle"
    }}
  ],
  "web_accessible_resources": [
    {{
      "resources": ["{name}.js", "{name}_bg.wasm"],
      "matches": ["{matches}"]
    }}
  ]
}}
"#,
        version = env!("CARGO_PKG_VERSION"),
        matches = PEDIGREE_MATCH,
        name = CRATE_NAME,
    )
}

fn loader() -> String {
    // content scriptはES moduleになれないので、動的importで本体を読む
    format!(
        r#"(async () => {{
  const mod = await import(chrome.runtime.getURL('{name}.js'));
  await mod.default({{ module_or_path: chrome.runtime.getURL('{name}_bg.wasm') }});
  mod.install();
}})().catch(console.error);
"#,
        name = CRATE_NAME,
    )
}
