//! End-to-end generation: source tree in, assembly out, kernel view checked
//! through the host-side link.

use linkapp_core::bundle::{Bundle, GnuAs, Syntax};
use linkapp_core::image::{link, AppTable};
use linkapp_core::{discover, emit, generate, BundleError, Config, LinkMap, SymbolScheme};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const BASE: u64 = 0x8040_0000;

fn tree(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let src = root.join("user/src/bin");
    let rel = root.join("user/target/riscv64gc-unknown-none-elf/release");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir_all(&rel).unwrap();
    (src, rel)
}

#[test]
fn empty_source_dir_gives_header_only_bundle() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    let out = root.path().join("kernel/src/link_app.S");

    let entries = discover(&src).unwrap();
    emit(&entries, &rel, &out).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.matches(".quad").count(), 1);
    assert!(text.contains(".quad 0"));
    assert!(!text.contains("app_"));

    let bundle = Bundle::build(&entries, &rel, &SymbolScheme::default());
    let image = link(&bundle.directives(), BASE).unwrap();
    assert_eq!(AppTable::parse(&image.bytes, BASE).unwrap().len(), 0);
}

#[test]
fn single_hello_bin() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    fs::write(src.join("hello.bin"), b"source").unwrap();
    let payload: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    fs::write(rel.join("hello"), &payload).unwrap();

    let entries = discover(&src).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "hello");

    let out = root.path().join("link_app.S");
    emit(&entries, &rel, &out).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.matches(".string").count(), 1);
    assert!(text.contains(".string \"hello\""));
    assert!(text.contains("app_0_start:\n"));
    assert!(text.contains("app_0_end:\n"));

    let map = LinkMap::build(&Bundle::build(&entries, &rel, &SymbolScheme::default()), BASE).unwrap();
    assert_eq!(map.apps[0].size, 4096);
    assert_eq!(map.apps[0].start % 8, 0);
}

#[test]
fn duplicate_logical_names_are_deterministic() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    for f in ["b.elf", "a.bin", "a.elf"] {
        fs::write(src.join(f), f).unwrap();
    }
    fs::write(rel.join("a"), b"AAAAAAAA").unwrap();
    fs::write(rel.join("b"), b"BBBB").unwrap();

    let out = root.path().join("link_app.S");
    let first = discover(&src).unwrap();
    emit(&first, &rel, &out).unwrap();
    let text_first = fs::read(&out).unwrap();

    let second = discover(&src).unwrap();
    assert_eq!(first, second);
    emit(&second, &rel, &out).unwrap();
    assert_eq!(text_first, fs::read(&out).unwrap());

    let bundle = Bundle::build(&first, &rel, &SymbolScheme::default());
    let image = link(&bundle.directives(), BASE).unwrap();
    let table = AppTable::parse(&image.bytes, BASE).unwrap();
    assert_eq!(table.names(), &["a", "b"]);
    assert_eq!(table.find("a").unwrap().1, b"AAAAAAAA");
    assert_eq!(table.find("b").unwrap().1, b"BBBB");
}

#[test]
fn every_bracket_matches_its_binary() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    let apps: Vec<(&str, Vec<u8>)> = vec![
        ("cat", vec![1; 5]),
        ("initproc", vec![2; 64]),
        ("ls", vec![3; 1]),
        ("user_shell", vec![4; 333]),
    ];
    for (name, data) in &apps {
        fs::write(src.join(format!("{name}.rs")), "").unwrap();
        fs::write(rel.join(name), data).unwrap();
    }

    let entries = discover(&src).unwrap();
    let bundle = Bundle::build(&entries, &rel, &SymbolScheme::default());
    let program = bundle.directives();

    let text = GnuAs.render(&program);
    let header_quads: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("    .quad app_"))
        .collect();
    assert_eq!(header_quads.iter().filter(|l| l.ends_with("_start")).count(), apps.len());
    assert_eq!(header_quads.iter().filter(|l| l.ends_with("_end")).count(), 1);
    assert_eq!(text.matches("_start:\n").count(), apps.len());
    assert_eq!(text.matches("_end:\n").count(), apps.len());

    let image = link(&program, BASE).unwrap();
    for (i, (_, data)) in apps.iter().enumerate() {
        let p = &bundle.payloads[i];
        assert_eq!(image.between(&p.start, &p.end).unwrap(), data.as_slice());
    }
}

#[test]
fn generate_uses_config_paths_and_scheme() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    fs::write(src.join("init.rs"), "").unwrap();
    fs::write(rel.join("init"), b"I").unwrap();

    let mut config = Config::default();
    config.source_dir = src;
    config.binary_dir = rel;
    config.output = root.path().join("gen/apps.S");
    config.symbols.payload_prefix = "payload".into();

    let entries = generate(&config).unwrap();
    assert_eq!(entries.len(), 1);
    let text = fs::read_to_string(&config.output).unwrap();
    assert!(text.contains("payload_0_start:"));
    assert!(text.contains(".quad payload_0_end"));
}

#[test]
fn missing_binary_aborts_before_output() {
    let root = tempdir().unwrap();
    let (src, rel) = tree(root.path());
    fs::write(src.join("init.rs"), "").unwrap();
    fs::write(src.join("shell.rs"), "").unwrap();
    fs::write(rel.join("init"), b"I").unwrap();

    let mut config = Config::default();
    config.source_dir = src;
    config.binary_dir = rel;
    config.output = root.path().join("gen/apps.S");

    let err = generate(&config).unwrap_err();
    assert!(matches!(err, BundleError::SourceBinaryMissing { ref name, .. } if name == "shell"));
    assert!(!config.output.exists());
}
