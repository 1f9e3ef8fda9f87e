use ilhash_fingerprint::{
    digest_bytes, fingerprint_paths, Disassembler, Disassembly, FingerprintError,
    NullDisassembler, Pipeline, PipelineOptions, TextEncoding,
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Treats any module whose bytes start with `.assembly` as valid IL and
/// copies it, plus any canned resources, into a fresh scratch directory.
struct FakeDisassembler {
    scratch_root: TempDir,
    resources: HashMap<String, Vec<(String, Vec<u8>)>>,
    calls: Cell<usize>,
    scratch_dirs: RefCell<Vec<PathBuf>>,
}

impl FakeDisassembler {
    fn new() -> Self {
        Self {
            scratch_root: tempfile::tempdir().unwrap(),
            resources: HashMap::new(),
            calls: Cell::new(0),
            scratch_dirs: RefCell::new(Vec::new()),
        }
    }

    fn with_resource(mut self, module: &str, name: &str, bytes: &[u8]) -> Self {
        self.resources
            .entry(module.to_string())
            .or_default()
            .push((name.to_string(), bytes.to_vec()));
        self
    }
}

impl Disassembler for FakeDisassembler {
    fn disassemble(&self, module: &Path) -> ilhash_fingerprint::Result<Disassembly> {
        let bytes = fs::read(module)?;
        if !bytes.starts_with(b".assembly") {
            return Ok(Disassembly::failed(module));
        }

        let call = self.calls.get();
        self.calls.set(call + 1);
        let dir = self.scratch_root.path().join(format!("run-{call}"));
        fs::create_dir(&dir)?;
        self.scratch_dirs.borrow_mut().push(dir.clone());

        let stem = module.file_stem().unwrap().to_string_lossy().into_owned();
        let il = dir.join(format!("{stem}.il"));
        fs::write(&il, &bytes)?;

        let name = module.file_name().unwrap().to_string_lossy().into_owned();
        let mut extracted = Vec::new();
        for (resource, content) in self.resources.get(&name).into_iter().flatten() {
            let path = dir.join(resource);
            fs::write(&path, content)?;
            extracted.push(path);
        }
        Ok(Disassembly::succeeded(il, extracted, Some(dir)))
    }
}

fn module_il(version: &str, mvid: &str) -> String {
    format!(
        ".assembly Sample\r\n{{\r\n  .ver {version}\r\n}}\r\n// MVID: {{{mvid}}}\r\n.method public static void Main() cil managed\r\n"
    )
}

/// Module whose Guid and InformationalVersion blobs wrap onto continuation
/// lines, with `)` echoed in the trailing ASCII comments.
fn module_with_blobs(guid_tail: &str, version: &str) -> String {
    format!(
        "\
.assembly Sample\r
{{\r
  .custom instance void [mscorlib]System.Runtime.InteropServices.GuidAttribute::.ctor(string) = ( 01 00 24 33 61 39 62 35 63 37 64 2D 31 32 33 34   // ..$3a9b5c7d-1234\r
                                                                                                  2D 34 35 36 37 2D 38 39 61 62 {guid_tail} 00 00 )    // -4567-89ab..\r
  .custom instance void [mscorlib]System.Reflection.AssemblyInformationalVersionAttribute::.ctor(string) = ( 01 00 0D {version} 20 28 62 29   // ...(b)\r
                                                                                                             20 72 63 31 00 00 )           // ) rc1..\r
}}\r
.method public static void Main() cil managed\r
"
    )
}

fn utf16(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    TextEncoding::Utf16Le.encode_into(text, &mut out);
    out
}

fn run(inputs: &[PathBuf], options: PipelineOptions) -> (String, ilhash_fingerprint::Manifest) {
    Pipeline::new(&FakeDisassembler::new(), options)
        .run(inputs)
        .unwrap()
}

#[test]
fn single_text_file_hashes_raw_bytes() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("a.txt");
    fs::write(&file, "hello").unwrap();

    for options in [PipelineOptions::default(), PipelineOptions::ignoring_versions()] {
        let (master, manifest) = run(&[file.clone()], options);
        let expected = digest_bytes(b"hello").to_base64();

        assert_eq!(manifest.components.len(), 1);
        assert_eq!(manifest.components[0].path, file.display().to_string());
        assert_eq!(manifest.components[0].hash, expected);
        assert_eq!(master, expected);
        assert_eq!(manifest.master_hash, master);
    }
}

#[test]
fn directory_components_are_sorted() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("dirA");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("y.txt"), "y").unwrap();
    fs::write(dir.join("x.txt"), "x").unwrap();

    let (_, manifest) = run(&[dir.clone()], PipelineOptions::default());
    let labels: Vec<_> = manifest.components.iter().map(|c| c.path.clone()).collect();
    assert_eq!(
        labels,
        vec![
            dir.join("x.txt").display().to_string(),
            dir.join("y.txt").display().to_string(),
        ]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("out");
    fs::create_dir_all(dir.join("sub")).unwrap();
    fs::write(dir.join("App.dll"), module_il("1:0:0:0", "A")).unwrap();
    fs::write(dir.join("sub/readme.md"), "docs").unwrap();
    fs::write(dir.join("config.json"), "{}").unwrap();

    let first = run(&[dir.clone()], PipelineOptions::ignoring_versions());
    let second = run(&[dir.clone()], PipelineOptions::ignoring_versions());
    assert_eq!(first, second);
}

#[test]
fn flat_list_order_changes_master_hash() {
    let temp = tempfile::tempdir().unwrap();
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "first").unwrap();
    fs::write(&b, "second").unwrap();

    let (forward, forward_manifest) = run(&[a.clone(), b.clone()], PipelineOptions::default());
    let (backward, backward_manifest) = run(&[b.clone(), a.clone()], PipelineOptions::default());

    assert_ne!(forward, backward);
    assert_eq!(forward, digest_bytes(b"firstsecond").to_base64());
    assert_eq!(forward_manifest.components[0], backward_manifest.components[1]);
}

#[test]
fn version_noise_is_ignored_when_requested() {
    let temp = tempfile::tempdir().unwrap();
    let v1 = temp.path().join("v1/Module.dll");
    let v2 = temp.path().join("v2/Module.dll");
    fs::create_dir_all(v1.parent().unwrap()).unwrap();
    fs::create_dir_all(v2.parent().unwrap()).unwrap();
    fs::write(&v1, module_il("1:0:0:0", "11111111-0000-0000-0000-000000000000")).unwrap();
    fs::write(&v2, module_il("2:0:0:0", "22222222-0000-0000-0000-000000000000")).unwrap();

    let (ignored_1, m1) = run(&[v1.clone()], PipelineOptions::ignoring_versions());
    let (ignored_2, m2) = run(&[v2.clone()], PipelineOptions::ignoring_versions());
    assert_eq!(ignored_1, ignored_2);
    assert_eq!(m1.components, m2.components);
    assert_eq!(m1.components[0].path, "Module.dll");

    let (strict_1, _) = run(&[v1], PipelineOptions::default());
    let (strict_2, _) = run(&[v2], PipelineOptions::default());
    assert_ne!(strict_1, strict_2);
}

#[test]
fn wrapped_attribute_blobs_are_ignored_when_requested() {
    let temp = tempfile::tempdir().unwrap();
    let v1 = temp.path().join("v1/Module.dll");
    let v2 = temp.path().join("v2/Module.dll");
    fs::create_dir_all(v1.parent().unwrap()).unwrap();
    fs::create_dir_all(v2.parent().unwrap()).unwrap();
    fs::write(&v1, module_with_blobs("31", "31 2E 30")).unwrap();
    fs::write(&v2, module_with_blobs("32", "32 2E 30")).unwrap();

    let (ignored_1, m1) = run(&[v1.clone()], PipelineOptions::ignoring_versions());
    let (ignored_2, m2) = run(&[v2.clone()], PipelineOptions::ignoring_versions());
    assert_eq!(ignored_1, ignored_2);
    assert_eq!(m1.components, m2.components);
    assert_eq!(
        ignored_1,
        digest_bytes(b".assembly Sample{}.method public static void Main() cil managed").to_base64()
    );

    let (strict_1, _) = run(&[v1], PipelineOptions::default());
    let (strict_2, _) = run(&[v2], PipelineOptions::default());
    assert_ne!(strict_1, strict_2);
}

#[test]
fn resource_version_lines_are_kept_by_default() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("Lib.dll");
    fs::write(&module, ".assembly Lib\n").unwrap();

    let hash_res = |file_version: &str, options: PipelineOptions| {
        let fake = FakeDisassembler::new().with_resource(
            "Lib.dll",
            "Lib.res",
            &utf16(&format!("CompanyName Acme\r\nFileVersion {file_version}\r\n")),
        );
        let (_, manifest) = Pipeline::new(&fake, options).run([&module]).unwrap();
        manifest.component("Lib.res").unwrap().hash.clone()
    };

    let kept = hash_res("1.0", PipelineOptions::default());
    assert_eq!(
        kept,
        digest_bytes(&utf16("CompanyName AcmeFileVersion 1.0")).to_base64()
    );
    assert_ne!(kept, hash_res("2.0", PipelineOptions::default()));
    assert_eq!(
        hash_res("1.0", PipelineOptions::ignoring_versions()),
        hash_res("2.0", PipelineOptions::ignoring_versions())
    );
}

#[test]
fn unrecognized_module_falls_back_to_raw_bytes() {
    let temp = tempfile::tempdir().unwrap();
    let garbage = temp.path().join("notAModule.dll");
    fs::write(&garbage, b"\x00\x01garbage\r\n\xFF").unwrap();

    let (master, manifest) = run(&[garbage.clone()], PipelineOptions::ignoring_versions());
    let expected = digest_bytes(b"\x00\x01garbage\r\n\xFF").to_base64();

    assert_eq!(manifest.components.len(), 1);
    assert_eq!(manifest.components[0].path, garbage.display().to_string());
    assert_eq!(manifest.components[0].hash, expected);
    assert_eq!(master, expected);
}

#[test]
fn empty_input_hashes_empty_stream() {
    let (master, manifest) = run(&[], PipelineOptions::default());
    assert_eq!(master, digest_bytes(b"").to_base64());
    assert!(manifest.components.is_empty());
}

#[test]
fn resources_get_their_own_components() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("Lib.dll");
    let notes = temp.path().join("notes.txt");
    fs::write(&module, ".assembly Lib\n{\n}\n").unwrap();
    fs::write(&notes, "n").unwrap();

    let fake = FakeDisassembler::new()
        .with_resource("Lib.dll", "Lib.res", &utf16("CompanyName Acme\r\nFileVersion 9.9\r\n"))
        .with_resource("Lib.dll", "Lib.Strings.resources", b"\x01\x02");
    let (master, manifest) = Pipeline::new(&fake, PipelineOptions::ignoring_versions())
        .run([&module, &notes])
        .unwrap();

    let labels: Vec<_> = manifest.components.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Lib.dll",
            "Lib.res",
            "Lib.Strings.resources",
            notes.display().to_string().as_str(),
        ]
    );
    assert_eq!(manifest.components[0].hash, digest_bytes(b".assembly Lib{}").to_base64());
    assert_eq!(
        manifest.components[1].hash,
        digest_bytes(&utf16("CompanyName Acme")).to_base64()
    );
    assert_eq!(manifest.components[2].hash, digest_bytes(b"\x01\x02").to_base64());

    let mut stream = b".assembly Lib{}".to_vec();
    stream.extend(utf16("CompanyName Acme"));
    stream.extend(b"\x01\x02n");
    assert_eq!(master, digest_bytes(&stream).to_base64());
}

#[test]
fn scratch_directories_are_removed_unless_kept() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("App.exe");
    fs::write(&module, ".assembly App\n").unwrap();

    let fake = FakeDisassembler::new();
    Pipeline::new(&fake, PipelineOptions::default())
        .run([&module])
        .unwrap();
    let removed = fake.scratch_dirs.borrow()[0].clone();
    assert!(!removed.exists());

    let options = PipelineOptions {
        keep_temporary_artifacts: true,
        ..Default::default()
    };
    Pipeline::new(&fake, options).run([&module]).unwrap();
    let kept = fake.scratch_dirs.borrow()[1].clone();
    assert!(kept.join("App.il").exists());
}

#[test]
fn decode_failure_aborts_and_cleans_up() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("Bad.dll");
    fs::write(&module, b".assembly Bad\n\xC3\x28\n").unwrap();

    let fake = FakeDisassembler::new();
    let err = Pipeline::new(&fake, PipelineOptions::default())
        .run([&module])
        .unwrap_err();

    assert!(matches!(err, FingerprintError::DecodeError { .. }));
    assert!(!fake.scratch_dirs.borrow()[0].exists());
}

#[test]
fn missing_input_aborts_the_run() {
    let temp = tempfile::tempdir().unwrap();
    let present = temp.path().join("present.txt");
    fs::write(&present, "x").unwrap();

    let err = Pipeline::new(&NullDisassembler, PipelineOptions::default())
        .run([present, temp.path().join("absent.txt")])
        .unwrap_err();
    assert!(matches!(err, FingerprintError::InvalidPath(_)));
}

#[test]
fn encoding_override_applies_to_text_artifacts() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("Wide.dll");
    fs::write(&module, ".assembly Wide\n").unwrap();

    let options = PipelineOptions {
        encoding_override: Some(TextEncoding::Utf16Le),
        ..Default::default()
    };
    let fake = FakeDisassembler::new();
    let err = Pipeline::new(&fake, options).run([&module]).unwrap_err();
    assert!(matches!(err, FingerprintError::DecodeError { encoding: "utf-16le", .. }));
}

#[test]
fn null_disassembler_hashes_modules_as_bytes() {
    let temp = tempfile::tempdir().unwrap();
    let module = temp.path().join("Real.dll");
    fs::write(&module, ".assembly Real\n.ver 1:0:0:0\n").unwrap();

    let master = fingerprint_paths([&module], &NullDisassembler).unwrap();
    assert_eq!(
        master,
        digest_bytes(b".assembly Real\n.ver 1:0:0:0\n").to_base64()
    );
}
