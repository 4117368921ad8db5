use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use spellpack::spelling::archive::{ZipArchive, ZipWriter};
use spellpack::spelling::io;
use spellpack::spelling::models::IMPORT_SOURCES;
use spellpack::{
    AffixCompiler, DictionaryHandle, DictionaryMeta, LocaleTag, ResourceRef, SpellingError,
    SpellingManager, StorageRoots, WordListCompiler,
};
use tempfile::TempDir;

// ─── Helpers ───────────────────────────────────────────────────────

fn setup() -> (TempDir, SpellingManager) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let manager = SpellingManager::new(
        StorageRoots::under(tmp.path()),
        Box::new(WordListCompiler::default()),
    );
    (tmp, manager)
}

fn write_archive(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap_or_else(|e| panic!("create {}: {}", path.display(), e));
    let mut writer = ZipWriter::new(file);
    for (name, data) in members {
        writer.add_member(name, data).expect("add member");
    }
    writer.finish().expect("finish archive");
}

fn external(path: &Path) -> ResourceRef {
    ResourceRef::external(&path.to_string_lossy())
}

/// Stage and install a raw word-list dictionary for `locale`.
fn install_raw(manager: &SpellingManager, dir: &Path, locale: &str, words: &[&str]) {
    let aff_path = dir.join(format!("{locale}-src.aff"));
    let dic_path = dir.join(format!("{locale}-src.dic"));
    fs::write(&aff_path, b"SET UTF-8\n").expect("write aff");
    let mut dic = format!("{}\n", words.len());
    for word in words {
        dic.push_str(word);
        dic.push('\n');
    }
    fs::write(&dic_path, dic).expect("write dic");

    let package = manager
        .prepare_import_raw(&external(&aff_path), &external(&dic_path), locale)
        .expect("raw import should stage");
    manager.finalize_import(package).expect("install");
}

/// Pseudorandom (and therefore incompressible) payload bytes.
fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

const MOZILLA_MANIFEST: &[u8] = br#"{
  "manifest_version": 2,
  "name": "English Spellchecker",
  "version": "3.1",
  "dictionaries": { "en-US": "dict1", "de-DE": "dict2" }
}"#;

// ─── Resource refs ─────────────────────────────────────────────────

#[test]
fn locator_construction_and_equality() {
    let a = ResourceRef::internal("/spelling/en.spk");
    assert_eq!(a.path(), "spelling/en.spk");
    assert_eq!(a, ResourceRef::from_uri("internal:spelling/en.spk"));
    assert_eq!(a, ResourceRef::from_uri("internal://spelling/en.spk"));
    assert_ne!(a, ResourceRef::cache("spelling/en.spk"));

    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&ResourceRef::internal("spelling/en.spk")));

    assert_eq!(a.to_string(), "internal:spelling/en.spk");
    assert_eq!(a.file_name(), Some("en.spk"));
}

#[test]
fn locator_sub_path_derives_new_values() {
    let base = ResourceRef::internal("spelling");
    let derived = base.sub_path("en.spk");
    assert_eq!(derived.to_string(), "internal:spelling/en.spk");
    // The base is untouched.
    assert_eq!(base.to_string(), "internal:spelling");

    let url = ResourceRef::external("https://example.com/dicts");
    assert_eq!(
        url.sub_path("en.zip").to_string(),
        "https://example.com/dicts/en.zip"
    );
}

#[test]
fn locator_absolute_path_mapping() {
    let roots = StorageRoots::new(PathBuf::from("/tmp/c"), PathBuf::from("/tmp/i"));
    assert_eq!(
        ResourceRef::cache("a/b").absolute_path(&roots),
        PathBuf::from("/tmp/c/a/b")
    );
    assert_eq!(
        ResourceRef::internal("a/b").absolute_path(&roots),
        PathBuf::from("/tmp/i/a/b")
    );
    // Bundled assets resolve to their relative path as-is.
    assert_eq!(
        ResourceRef::assets("dicts/en.aff").absolute_path(&roots),
        PathBuf::from("dicts/en.aff")
    );
    assert_eq!(
        ResourceRef::external("file:///etc/hosts").absolute_path(&roots),
        PathBuf::from("/etc/hosts")
    );
    assert_eq!(
        ResourceRef::external("/etc/hosts").absolute_path(&roots),
        PathBuf::from("/etc/hosts")
    );
}

#[test]
fn asset_read_without_assets_root_is_context_unavailable() {
    let roots = StorageRoots::new(PathBuf::from("/tmp/c"), PathBuf::from("/tmp/i"));
    let result = io::open_source(&ResourceRef::assets("dicts/en.aff"), &roots);
    assert!(matches!(result, Err(SpellingError::ContextUnavailable)));
}

// ─── Locale tags ───────────────────────────────────────────────────

#[test]
fn locale_tag_canonicalization() {
    assert_eq!(LocaleTag::parse("EN_us").to_string(), "en-US");
    assert_eq!(LocaleTag::parse("en-US"), LocaleTag::parse("en_us"));
    assert_eq!(LocaleTag::parse("sr_latn_rs").to_string(), "sr-Latn-RS");

    let tag = LocaleTag::parse("de-DE");
    assert_eq!(tag.language(), "de");
    assert_eq!(tag.region(), Some("DE"));
    assert_eq!(LocaleTag::parse("de").region(), None);
}

// ─── Archive container ─────────────────────────────────────────────

#[test]
fn archive_members_round_trip() {
    let tmp = TempDir::new().expect("temp dir");
    let path = tmp.path().join("pack.zip");
    let text = b"the quick brown fox jumps over the lazy dog, repeatedly and compressibly";
    let incompressible = noise(256);
    write_archive(&path, &[("a/text.txt", text), ("blob.bin", &incompressible)]);

    let mut zip = ZipArchive::new(File::open(&path).expect("open")).expect("parse");
    assert_eq!(zip.member_names(), vec!["a/text.txt", "blob.bin"]);
    assert!(zip.contains("blob.bin"));
    assert!(!zip.contains("missing"));
    assert_eq!(zip.read_member("a/text.txt").expect("read"), text);
    assert_eq!(zip.read_member("blob.bin").expect("read"), incompressible);

    let missing = zip.read_member("missing");
    assert!(matches!(
        missing,
        Err(SpellingError::ArchiveMemberMissing { member }) if member == "missing"
    ));
}

#[test]
fn archive_corrupted_payload_fails_checksum() {
    let tmp = TempDir::new().expect("temp dir");
    let path = tmp.path().join("pack.zip");
    // Incompressible payload is stored verbatim, so a payload flip hits the
    // CRC check rather than the inflater.
    write_archive(&path, &[("blob.bin", &noise(256))]);

    let mut bytes = fs::read(&path).expect("read archive");
    let payload_offset = 30 + "blob.bin".len();
    bytes[payload_offset + 3] ^= 0xFF;
    fs::write(&path, &bytes).expect("write corrupted");

    let mut zip = ZipArchive::new(File::open(&path).expect("open")).expect("parse");
    assert!(matches!(
        zip.read_member("blob.bin"),
        Err(SpellingError::ChecksumMismatch { .. })
    ));
}

#[test]
fn archive_truncated_or_empty_is_invalid() {
    let tmp = TempDir::new().expect("temp dir");
    let path = tmp.path().join("pack.zip");
    write_archive(&path, &[("a.txt", b"alpha")]);

    let bytes = fs::read(&path).expect("read");
    fs::write(&path, &bytes[..bytes.len() - 10]).expect("truncate");
    assert!(matches!(
        ZipArchive::new(File::open(&path).expect("open")),
        Err(SpellingError::InvalidArchive(_))
    ));

    fs::write(&path, b"").expect("empty");
    assert!(matches!(
        ZipArchive::new(File::open(&path).expect("open")),
        Err(SpellingError::InvalidArchive(_))
    ));
}

// ─── Bounded reads ─────────────────────────────────────────────────

#[test]
fn bounded_copy_rejects_oversized_source_without_leaving_a_file() {
    let tmp = TempDir::new().expect("temp dir");
    let dest = tmp.path().join("copy.bin");

    let mut big: &[u8] = b"twenty bytes exactly";
    let result = io::copy_reader_bounded(&mut big, &dest, 16);
    assert!(matches!(
        result,
        Err(SpellingError::SizeLimitExceeded { limit: 16 })
    ));
    assert!(!dest.exists());

    // A source exactly at the limit passes untouched.
    let mut exact: &[u8] = b"sixteen bytes ok";
    assert_eq!(io::copy_reader_bounded(&mut exact, &dest, 16).expect("copy"), 16);
    assert_eq!(fs::read(&dest).expect("read"), b"sixteen bytes ok");
}

// ─── Metadata ──────────────────────────────────────────────────────

#[test]
fn meta_builder_requires_all_mandatory_fields() {
    let result = DictionaryMeta::builder()
        .locale(LocaleTag::parse("en"))
        .original_source("raw")
        .aff_file("en.aff")
        .build();
    assert!(matches!(
        result,
        Err(SpellingError::MetadataIncomplete { field: "dic_file" })
    ));
}

#[test]
fn meta_round_trips_through_its_persisted_record() {
    let meta = DictionaryMeta::builder()
        .locale(LocaleTag::parse("pt-BR"))
        .original_source("freeoffice")
        .title("Português (Brasil)")
        .version("2024.06")
        .aff_file("pt_BR.aff")
        .dic_file("pt_BR.dic")
        .license_file("LICENSE.txt")
        .build()
        .expect("build");
    assert_eq!(meta.id, "freeoffice.pt-br");

    let encoded = serde_json::to_vec(&meta).expect("encode");
    let decoded: DictionaryMeta = serde_json::from_slice(&encoded).expect("decode");
    assert_eq!(decoded, meta);
}

// ─── Importers ─────────────────────────────────────────────────────

#[test]
fn mozilla_import_honors_first_manifest_entry() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dicts.xpi");
    write_archive(
        &archive,
        &[
            ("manifest.json", MOZILLA_MANIFEST),
            ("dictionaries/dict1.aff", b"SFX A Y 1\n"),
            ("dictionaries/dict1.dic", b"1\ncolor\n"),
            ("dictionaries/dict2.aff", b"SFX B Y 1\n"),
            ("dictionaries/dict2.dic", b"1\nfarbe\n"),
        ],
    );

    let package = manager
        .prepare_import("mozilla", &external(&archive))
        .expect("import should stage");
    let meta = &package.meta;
    assert_eq!(meta.locale.to_string(), "en-US");
    assert_eq!(meta.aff_file, "dict1.aff");
    assert_eq!(meta.dic_file, "dict1.dic");
    assert_eq!(meta.original_source_id, "mozilla");
    assert_eq!(meta.title.as_deref(), Some("English Spellchecker"));
    assert_eq!(meta.version.as_deref(), Some("3.1"));
    assert_eq!(meta.id, "mozilla.en-us");
    assert_eq!(
        meta.package_file_name(),
        package.final_archive_target.file_name().expect("target name")
    );

    // Exactly the first entry's pair is staged, prefix stripped.
    let staged: HashSet<String> = fs::read_dir(&package.working_dir)
        .expect("read staged dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        staged,
        HashSet::from(["dict1.aff".to_string(), "dict1.dic".to_string()])
    );
}

#[test]
fn mozilla_import_tolerates_prefixed_manifest_values() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dicts.xpi");
    write_archive(
        &archive,
        &[
            (
                "manifest.json",
                br#"{"manifest_version":2,"dictionaries":{"de-DE":"dictionaries/de-DE.dic"}}"#,
            ),
            ("dictionaries/de-DE.aff", b"SET UTF-8\n"),
            ("dictionaries/de-DE.dic", b"1\nfarbe\n"),
        ],
    );

    let package = manager
        .prepare_import("mozilla", &external(&archive))
        .expect("import should stage");
    assert_eq!(package.meta.aff_file, "de-DE.aff");
    assert_eq!(package.meta.locale.to_string(), "de-DE");
}

#[test]
fn mozilla_import_without_manifest_fails_clean() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dicts.xpi");
    write_archive(&archive, &[("dictionaries/dict1.aff", b"SFX A Y 1\n")]);

    let result = manager.prepare_import("mozilla", &external(&archive));
    assert!(matches!(
        result,
        Err(SpellingError::ArchiveMemberMissing { member }) if member == "manifest.json"
    ));

    // Nothing was staged before the failure.
    let staged_dir = manager.roots().cache.join("importer/mozilla/staged");
    let staged: Vec<_> = fs::read_dir(&staged_dir)
        .expect("staging dir exists")
        .collect();
    assert!(staged.is_empty());
}

#[test]
fn mozilla_import_with_empty_mapping_fails() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dicts.xpi");
    write_archive(
        &archive,
        &[("manifest.json", br#"{"manifest_version":2,"dictionaries":{}}"#)],
    );

    let result = manager.prepare_import("mozilla", &external(&archive));
    assert!(matches!(result, Err(SpellingError::EmptyManifest)));
}

#[test]
fn freeoffice_import_scans_config_and_members() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dict.sox");
    write_archive(
        &archive,
        &[
            (
                "dict.ini",
                b"; office dictionary\nencoding=UTF-8\nfile=en_US\nsupported_locales=en_US; en_GB\n",
            ),
            ("hunspell/en_US.aff", b"SET UTF-8\n"),
            ("hunspell/en_US.dic", b"2\ncolor\ncolour\n"),
            ("COPYING.rtf", b"MPL 1.1"),
            ("second_license.txt", b"should be ignored"),
            ("readme_en.txt", b"An English dictionary"),
        ],
    );

    let package = manager
        .prepare_import("freeoffice", &external(&archive))
        .expect("import should stage");
    let meta = &package.meta;
    assert_eq!(meta.locale.to_string(), "en-US");
    assert_eq!(meta.aff_file, "en_US.aff");
    assert_eq!(meta.dic_file, "en_US.dic");
    assert_eq!(meta.license_file.as_deref(), Some("LICENSE.txt"));
    assert_eq!(meta.readme_file.as_deref(), Some("README.txt"));
    assert_eq!(meta.original_source_id, "freeoffice");

    // The first license-like member wins and lands under the canonical name.
    let license = fs::read(package.working_dir.join("LICENSE.txt")).expect("license staged");
    assert_eq!(license, b"MPL 1.1");
    let readme = fs::read(package.working_dir.join("README.txt")).expect("readme staged");
    assert_eq!(readme, b"An English dictionary");
}

#[test]
fn freeoffice_import_requires_both_config_keys() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("dict.sox");
    write_archive(
        &archive,
        &[
            ("dict.ini", b"file=en_US\n"),
            ("en_US.aff", b"SET UTF-8\n"),
            ("en_US.dic", b"1\ncolor\n"),
        ],
    );

    let result = manager.prepare_import("freeoffice", &external(&archive));
    assert!(matches!(
        result,
        Err(SpellingError::MetadataIncomplete { field: "supported_locales" })
    ));
}

#[test]
fn raw_import_synthesizes_canonical_names() {
    let (tmp, manager) = setup();
    let aff_path = tmp.path().join("x.aff");
    let dic_path = tmp.path().join("x.dic");
    fs::write(&aff_path, b"SET UTF-8\n").expect("write aff");
    fs::write(&dic_path, b"1\ncolor\n").expect("write dic");

    let package = manager
        .prepare_import_raw(&external(&aff_path), &external(&dic_path), "en-US")
        .expect("raw import should stage");
    let meta = &package.meta;
    assert_eq!(meta.aff_file, "en-US.aff");
    assert_eq!(meta.dic_file, "en-US.dic");
    assert_eq!(meta.original_source_id, "raw");
    assert!(meta.title.is_some());
    assert!(package.working_dir.join("en-US.aff").exists());
    assert!(package.working_dir.join("en-US.dic").exists());
}

#[test]
fn unknown_source_id_is_rejected() {
    let (tmp, manager) = setup();
    let archive = tmp.path().join("a.zip");
    write_archive(&archive, &[("x", b"y")]);

    let result = manager.prepare_import("word-perfect", &external(&archive));
    assert!(matches!(
        result,
        Err(SpellingError::UnsupportedSource(id)) if id == "word-perfect"
    ));
}

// ─── Install, index, resolve ───────────────────────────────────────

#[test]
fn finalize_packs_members_and_indexes_them() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "nl", &["fiets", "gracht"]);

    let installed = manager.installed_dictionaries();
    assert_eq!(installed.len(), 1);
    let (locator, meta) = &installed[0];
    assert_eq!(meta.id, "raw.nl");
    assert_eq!(locator.to_string(), "internal:spelling/raw.nl.spk");

    // The packed unit holds the metadata record plus members under their
    // recorded names.
    let path = locator.absolute_path(manager.roots());
    let mut zip = ZipArchive::new(File::open(&path).expect("open package")).expect("parse");
    let reloaded: DictionaryMeta =
        serde_json::from_slice(&zip.read_member("meta.json").expect("meta")).expect("decode");
    assert_eq!(&reloaded, meta);
    assert_eq!(zip.read_member("nl.dic").expect("dic"), b"2\nfiets\ngracht\n");
    assert!(zip.contains("nl.aff"));
}

#[test]
fn reindex_is_stable_without_filesystem_changes() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "en", &["apple"]);
    install_raw(&manager, tmp.path(), "de", &["apfel"]);

    assert!(manager.reindex());
    let first: HashMap<_, _> = manager.installed_dictionaries().into_iter().collect();
    assert!(manager.reindex());
    let second: HashMap<_, _> = manager.installed_dictionaries().into_iter().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn resolve_prefers_exact_locale_over_language_fallback() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "en", &["apple"]);
    install_raw(&manager, tmp.path(), "en-US", &["banana"]);

    let handle = manager
        .resolve(&LocaleTag::parse("en-US"))
        .expect("exact match should resolve");
    assert_eq!(handle.suggest("banana"), vec!["banana".to_string()]);
    assert!(handle.suggest("apple").is_empty());
}

#[test]
fn resolve_falls_back_to_primary_language() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "en", &["apple"]);
    install_raw(&manager, tmp.path(), "en-US", &["banana"]);

    // Fallback picks whichever en* entry is first in index (scan) order;
    // scan order is filesystem-dependent, so only membership is asserted.
    let handle = manager
        .resolve(&LocaleTag::parse("en-GB"))
        .expect("fallback should resolve");
    let is_en = handle.suggest("apple") == vec!["apple".to_string()];
    let is_en_us = handle.suggest("banana") == vec!["banana".to_string()];
    assert!(is_en || is_en_us);
}

#[test]
fn resolve_without_any_match_is_not_an_error() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "en", &["apple"]);
    assert!(manager.resolve(&LocaleTag::parse("fr")).is_none());
}

#[test]
fn resolve_compiles_once_and_caches_the_handle() {
    struct CountingCompiler {
        calls: Arc<AtomicUsize>,
        inner: WordListCompiler,
    }
    impl AffixCompiler for CountingCompiler {
        fn compile(&self, aff: &[u8], dic: &[u8]) -> spellpack::Result<Arc<dyn DictionaryHandle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.compile(aff, dic)
        }
    }

    let tmp = TempDir::new().expect("temp dir");
    let calls = Arc::new(AtomicUsize::new(0));
    let manager = SpellingManager::new(
        StorageRoots::under(tmp.path()),
        Box::new(CountingCompiler {
            calls: Arc::clone(&calls),
            inner: WordListCompiler::default(),
        }),
    );
    install_raw(&manager, tmp.path(), "en-US", &["banana"]);

    let locale = LocaleTag::parse("en-US");
    let first = manager.resolve(&locale).expect("first resolution");
    let second = manager.resolve(&locale).expect("second resolution");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn corrupt_installed_package_resolves_to_none() {
    let (tmp, manager) = setup();
    install_raw(&manager, tmp.path(), "en", &["apple"]);

    let (locator, _) = manager.installed_dictionaries().remove(0);
    let path = locator.absolute_path(manager.roots());
    let bytes = fs::read(&path).expect("read package");
    fs::write(&path, &bytes[..bytes.len() / 2]).expect("corrupt package");

    // The index still lists the package; loading it must fail quietly.
    assert!(manager.resolve(&LocaleTag::parse("en")).is_none());
}

// ─── Import source catalogue ───────────────────────────────────────

#[test]
fn listed_import_sources_lead_with_the_none_sentinel() {
    let (labels, urls) = SpellingManager::listed_import_sources();
    assert_eq!(labels.len(), urls.len());
    assert_eq!(labels[0], "-");
    assert!(urls[0].is_none());
    assert_eq!(IMPORT_SOURCES[0].id, "");
    assert!(IMPORT_SOURCES.iter().any(|s| s.id == "mozilla"));
    assert!(IMPORT_SOURCES.iter().any(|s| s.id == "freeoffice"));
    assert!(IMPORT_SOURCES.iter().any(|s| s.id == "raw"));
}
