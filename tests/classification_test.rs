//! Signature-table classification and entrypoint resolution over small
//! throwaway projects, one per supported stack

use dockmate::pipeline::phases::classify::classify;
use dockmate::pipeline::phases::entrypoint::{resolve, EntrypointSource};
use dockmate::pipeline::phases::scan::{scan, FileManifest, ScanConfig};
use dockmate::pipeline::{FailureReason, StageError};
use dockmate::stack::{BuildSystemId, FrameworkId, LanguageId};
use std::fs;
use tempfile::TempDir;
use yare::parameterized;

fn project(files: &[(&str, &str)]) -> (TempDir, FileManifest) {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let target = dir.path().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, content).unwrap();
    }
    let manifest = scan(dir.path(), &ScanConfig::default()).unwrap();
    (dir, manifest)
}

#[parameterized(
    express_npm = {
        &[
            ("package.json", r#"{"dependencies": {"express": "^4.19.0"}}"#),
            ("package-lock.json", "{}"),
            ("server.js", "require('express')"),
        ],
        LanguageId::JavaScript, BuildSystemId::Npm, Some(FrameworkId::Express)
    },
    nestjs_pnpm_typescript = {
        &[
            ("package.json", r#"{"dependencies": {"@nestjs/core": "^10.3.0"}}"#),
            ("pnpm-lock.yaml", "lockfileVersion: '9.0'\n"),
            ("tsconfig.json", "{}"),
            ("src/main.ts", "import { NestFactory } from '@nestjs/core';\n"),
        ],
        LanguageId::TypeScript, BuildSystemId::Pnpm, Some(FrameworkId::NestJs)
    },
    django_pip = {
        &[
            ("requirements.txt", "django==5.0.6\npsycopg2-binary==2.9.9\n"),
            ("manage.py", "import django\n"),
        ],
        LanguageId::Python, BuildSystemId::Pip, Some(FrameworkId::Django)
    },
    fastapi_poetry = {
        &[
            (
                "pyproject.toml",
                "[tool.poetry]\nname = \"svc\"\nversion = \"0.1.0\"\n\n[tool.poetry.dependencies]\npython = \"^3.12\"\nfastapi = \"^0.110\"\n",
            ),
            ("poetry.lock", ""),
            ("svc/main.py", "from fastapi import FastAPI\napp = FastAPI()\n"),
        ],
        LanguageId::Python, BuildSystemId::Poetry, Some(FrameworkId::FastApi)
    },
    echo_go_mod = {
        &[
            ("go.mod", "module example.com/shop\n\ngo 1.22\n\nrequire github.com/labstack/echo/v4 v4.12.0\n"),
            ("main.go", "package main\n"),
        ],
        LanguageId::Go, BuildSystemId::GoMod, Some(FrameworkId::Echo)
    },
    plain_cargo = {
        &[
            ("Cargo.toml", "[package]\nname = \"tool\"\nversion = \"0.1.0\"\n"),
            ("src/main.rs", "fn main() {}\n"),
        ],
        LanguageId::Rust, BuildSystemId::Cargo, None
    },
    rails_bundler = {
        &[
            ("Gemfile", "source \"https://rubygems.org\"\n\ngem \"rails\", \"~> 7.1\"\n"),
            ("Gemfile.lock", ""),
            ("config.ru", "run Rails.application\n"),
        ],
        LanguageId::Ruby, BuildSystemId::Bundler, Some(FrameworkId::Rails)
    },
    laravel_composer = {
        &[
            ("composer.json", r#"{"require": {"php": "^8.2", "laravel/framework": "^11.0"}}"#),
            ("composer.lock", "{}"),
            ("artisan", "#!/usr/bin/env php\n"),
        ],
        LanguageId::Php, BuildSystemId::Composer, Some(FrameworkId::Laravel)
    },
)]
fn test_classifies_stack(
    files: &[(&str, &str)],
    language: LanguageId,
    build_system: BuildSystemId,
    framework: Option<FrameworkId>,
) {
    let (_dir, manifest) = project(files);
    let profile = classify(&manifest).unwrap();
    assert_eq!(profile.language, language);
    assert_eq!(profile.build_system, build_system);
    assert_eq!(profile.framework, framework);
}

#[parameterized(
    lockfile_conflict = {
        &[
            ("package.json", r#"{"name": "web"}"#),
            ("package-lock.json", "{}"),
            ("yarn.lock", ""),
            ("index.js", ""),
        ]
    },
    lockfile_conflict_with_yarnrc = {
        &[
            ("package.json", r#"{"dependencies": {"express": "^4.19.0"}}"#),
            ("package-lock.json", "{}"),
            ("yarn.lock", ""),
            (".yarnrc.yml", "nodeLinker: node-modules\n"),
            ("index.js", ""),
        ]
    },
    lockfile_conflict_with_shrinkwrap = {
        &[
            ("package.json", r#"{"name": "web"}"#),
            ("package-lock.json", "{}"),
            ("npm-shrinkwrap.json", "{}"),
            ("yarn.lock", ""),
            ("index.js", ""),
        ]
    },
    two_frameworks = {
        &[("requirements.txt", "flask==3.0.0\nfastapi==0.110.0\n")]
    },
)]
fn test_equal_signatures_are_ambiguous(files: &[(&str, &str)]) {
    let (_dir, manifest) = project(files);
    let err = classify(&manifest).unwrap_err();
    assert_eq!(err.reason(), FailureReason::Ambiguous);
    assert!(!err.details().is_empty());
}

#[test]
fn test_sources_without_manifest_are_unrecognized_with_hint() {
    let (_dir, manifest) = project(&[("main.py", ""), ("util.py", ""), ("README.md", "")]);
    let err = classify(&manifest).unwrap_err();
    assert_eq!(err.reason(), FailureReason::Unrecognized);
    assert!(err.to_string().contains("Python"), "{}", err);
}

#[test]
fn test_procfile_web_entry_wins_over_scripts() {
    let (_dir, manifest) = project(&[
        (
            "package.json",
            r#"{"scripts": {"start": "node index.js"}, "dependencies": {"express": "^4.19.0"}}"#,
        ),
        ("package-lock.json", "{}"),
        ("index.js", ""),
        ("Procfile", "web: node cluster.js --port 4100\nworker: node jobs.js\n"),
    ]);
    let profile = classify(&manifest).unwrap();
    let resolution = resolve(&manifest, &profile).unwrap();
    assert_eq!(resolution.entrypoint.source, EntrypointSource::Procfile);
    assert_eq!(resolution.entrypoint.start_command, "node cluster.js --port 4100");
    assert_eq!(resolution.entrypoint.ports, vec![4100]);
}

#[test]
fn test_framework_default_port_fills_gap() {
    let (_dir, manifest) = project(&[
        ("requirements.txt", "flask==3.0.3\n"),
        ("app.py", "from flask import Flask\napp = Flask(__name__)\n"),
    ]);
    let profile = classify(&manifest).unwrap();
    let resolution = resolve(&manifest, &profile).unwrap();
    assert_eq!(resolution.entrypoint.ports, vec![5000]);
    assert_eq!(resolution.entrypoint.source, EntrypointSource::Framework);
}
