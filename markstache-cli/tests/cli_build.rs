use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

#[allow(deprecated)]
fn markstache() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("markstache")?)
}

#[test]
fn build_renders_pages_with_toc() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(
        &dir.path().join("templates/default.mustache"),
        "<title>{{title}}</title><nav>{{{toc}}}</nav>{{{body}}}",
    )?;
    write(
        &dir.path().join("src/index.md"),
        "---\ntitle: Home\n---\n# Welcome\n## Setup\nSee [the guide](guide/intro.md#top).\n",
    )?;
    write(&dir.path().join("src/guide/intro.md"), "# Intro\n")?;
    write(&dir.path().join("src/notes.txt"), "not markdown")?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out"])
        .assert()
        .success();

    let index = fs::read_to_string(dir.path().join("out/index.html"))?;
    assert!(index.starts_with("<title>Home</title>"));
    assert!(index.contains(r##"<a href="#setup">Setup</a>"##));
    assert!(index.contains(r#"<h2 id="setup">Setup</h2>"#));
    assert!(index.contains(r##"href="guide/intro.html#top""##));

    assert!(dir.path().join("out/guide/intro.html").exists());
    assert!(!dir.path().join("out/notes.txt").exists());
    Ok(())
}

#[test]
fn build_honours_path_attribute() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("templates/default.mustache"), "{{{body}}}")?;
    write(
        &dir.path().join("src/page.md"),
        "---\npath: /nested/custom.html\n---\nHello\n",
    )?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out"])
        .assert()
        .success();

    let page = fs::read_to_string(dir.path().join("out/nested/custom.html"))?;
    assert_eq!(page, "<p>Hello</p>\n");
    assert!(!dir.path().join("out/page.html").exists());
    Ok(())
}

#[test]
fn build_skips_documents_with_missing_template() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("templates/default.mustache"), "{{{body}}}")?;
    write(
        &dir.path().join("src/orphan.md"),
        "---\ntemplate: nowhere\n---\nLost\n",
    )?;
    write(&dir.path().join("src/kept.md"), "Kept\n")?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unable to locate 'nowhere' template"));

    assert!(!dir.path().join("out/orphan.html").exists());
    assert!(dir.path().join("out/kept.html").exists());
    Ok(())
}

#[test]
fn build_fails_on_bad_frontmatter_but_renders_the_rest() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempdir()?;
    write(&dir.path().join("templates/default.mustache"), "{{{body}}}")?;
    write(&dir.path().join("src/a.md"), "---\ntitle: [oops\n---\nBroken\n")?;
    write(&dir.path().join("src/b.md"), "Fine\n")?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 document(s) failed to render"));

    assert!(!dir.path().join("out/a.html").exists());
    assert!(dir.path().join("out/b.html").exists());
    Ok(())
}

#[test]
fn build_reports_unwritable_page_but_writes_the_rest() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(&dir.path().join("templates/default.mustache"), "{{{body}}}")?;
    write(
        &dir.path().join("src/blocked.md"),
        "---\npath: taken/blocked.html\n---\nBlocked\n",
    )?;
    write(&dir.path().join("src/good.md"), "Good\n")?;
    // A file where the page's directory should go
    write(&dir.path().join("out/taken"), "")?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to create directory"))
        .stderr(predicate::str::contains("1 document(s) failed to render"));

    let good = fs::read_to_string(dir.path().join("out/good.html"))?;
    assert_eq!(good, "<p>Good</p>\n");
    Ok(())
}

#[test]
fn build_refuses_paths_outside_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(
        &dir.path().join("project/src/escape.md"),
        "---\npath: ../../escaped.html\n---\nNope\n",
    )?;
    write(&dir.path().join("project/src/stay.md"), "Stay\n")?;
    write(&dir.path().join("project/templates/default.mustache"), "{{{body}}}")?;

    markstache()?
        .current_dir(dir.path().join("project"))
        .args(["build", "src", "--out", "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("outside the output directory"));

    assert!(!dir.path().join("escaped.html").exists());
    assert!(!dir.path().join("project/escaped.html").exists());
    assert!(dir.path().join("project/out/stay.html").exists());
    Ok(())
}

#[test]
fn build_reads_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(
        &dir.path().join("site/markstache.yml"),
        "templatePath: layouts\nupdateLinks: false\npartials:\n  footer: layouts/footer.mustache\n",
    )?;
    write(
        &dir.path().join("site/layouts/default.mustache"),
        "{{{body}}}{{> footer}}",
    )?;
    write(&dir.path().join("site/layouts/footer.mustache"), "<footer/>")?;
    write(&dir.path().join("docs/a.md"), "[b](b.md)\n")?;

    markstache()?
        .current_dir(dir.path())
        .args([
            "--config",
            "site/markstache.yml",
            "build",
            "docs",
            "--out",
            "out",
        ])
        .assert()
        .success();

    let page = fs::read_to_string(dir.path().join("out/a.html"))?;
    assert!(page.contains(r#"href="b.md""#));
    assert!(page.ends_with("<footer/>"));
    Ok(())
}

#[test]
fn build_without_toc() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(
        &dir.path().join("templates/default.mustache"),
        "[{{{toc}}}]{{{body}}}",
    )?;
    write(&dir.path().join("src/a.md"), "# Title\n")?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "src", "--out", "out", "--no-toc"])
        .assert()
        .success();

    let page = fs::read_to_string(dir.path().join("out/a.html"))?;
    assert_eq!(page, "[]<h1>Title</h1>\n");
    Ok(())
}

#[test]
fn build_rejects_missing_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    markstache()?
        .current_dir(dir.path())
        .args(["build", "missing", "--out", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
    Ok(())
}
