use std::error::Error;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn Error>>;

const PHP_SOURCE: &str = "<?php\n// say hello\nif ($a)  {\n\techo 'hi' . $b; /* done */\n}\n?>\n<p>  keep  me  </p>\n";
const PHP_OPTIMIZED: &str = "<?php\n\nif($a){\necho 'hi'.$b;\n}\n?>\n<p>  keep  me  </p>\n";

#[test]
fn optimizes_php_files_and_copies_the_rest() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    let www = temp.child("www");
    www.child("index.php").write_str(PHP_SOURCE)?;
    www.child("css/style.css").write_str("body  {  color: red; } // not php\n")?;

    let out = temp.child("build");

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .arg("-i")
        .arg("www")
        .arg("-o")
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("Optimizing index.php"))
        .stderr(predicate::str::contains("Copying css/style.css"))
        .stderr(predicate::str::contains("Optimization achieved in"));

    out.child("index.php").assert(PHP_OPTIMIZED);
    out.child("css/style.css")
        .assert("body  {  color: red; } // not php\n");

    Ok(())
}

#[test]
fn single_file_input_lands_in_output_folder() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("page.php").write_str(PHP_SOURCE)?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .arg("-i")
        .arg("page.php")
        .arg("-o")
        .arg("out")
        .assert()
        .success();

    temp.child("out/page.php").assert(PHP_OPTIMIZED);

    Ok(())
}

#[test]
fn modules_select_the_stages() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("src/a.php")
        .write_str("<?php\n$a = 1; // one\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "src", "-o", "comments-only", "-m", "comments"])
        .assert()
        .success();
    temp.child("comments-only/a.php").assert("<?php\n$a = 1; \n");

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "src", "-o", "spaces-only", "-m", "spaces"])
        .assert()
        .success();
    temp.child("spaces-only/a.php").assert("<?php\n$a=1;// one\n");

    Ok(())
}

#[test]
fn unknown_modules_are_ignored_with_a_warning() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("src/a.php").write_str("<?php\n$a = 1; // one\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "src", "-o", "out", "-m", "bogus", "comments"])
        .assert()
        .success()
        .stderr(predicate::str::contains("bogus"));

    temp.child("out/a.php").assert("<?php\n$a = 1; \n");

    Ok(())
}

#[test]
fn excluded_paths_are_copied_verbatim() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    let src = temp.child("src");
    src.child("app.php").write_str("<?php $a = 1; // x\n")?;
    src.child("vendor/lib.php").write_str("<?php $b = 2; // y\n")?;
    src.child("views/home.tpl.php").write_str("<?php $c = 3; // z\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "src", "-o", "out", "-e", "/vendor", "*.tpl.php"])
        .assert()
        .success();

    temp.child("out/app.php").assert("<?php $a=1;\n");
    temp.child("out/vendor/lib.php").assert("<?php $b = 2; // y\n");
    temp.child("out/views/home.tpl.php")
        .assert("<?php $c = 3; // z\n");

    Ok(())
}

#[test]
fn output_inside_input_is_not_walked() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("a.php").write_str("<?php $a = 1;\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", ".", "-o", "build", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"optimized\":1"));

    temp.child("build/a.php").assert("<?php $a=1;\n");
    temp.child("build/build").assert(predicate::path::missing());

    Ok(())
}

#[test]
fn json_report_counts_files() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("in/a.php").write_str("<?php  $a = 1;\n")?;
    temp.child("in/b.txt").write_str("text\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "in", "-o", "out", "--json", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"optimized\":1"))
        .stdout(predicate::str::contains("\"copied\":1"))
        .stdout(predicate::str::contains("\"failed\":0"))
        .stderr(predicate::str::contains("Optimizing").not());

    Ok(())
}

#[test]
fn latin1_input_can_be_written_as_utf8() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("in/a.php")
        .write_binary(b"<?php echo 'caf\xE9' ;\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "in", "-o", "out", "--ics", "ISO-8859-1", "--ocs", "utf8"])
        .assert()
        .success();

    temp.child("out/a.php").assert("<?php echo 'café';\n");

    Ok(())
}

#[test]
fn single_dash_charset_flags_are_accepted() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("in/a.php")
        .write_binary(b"<?php echo 'caf\xE9' ;\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "in", "-o", "out", "-ics", "ISO-8859-1", "-ocs", "utf8"])
        .assert()
        .success();

    temp.child("out/a.php").assert("<?php echo 'café';\n");

    Ok(())
}

#[test]
fn dash_v_prints_the_version() -> TestResult {
    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("poptimizer"));

    Ok(())
}

#[test]
fn undecodable_file_fails_the_run() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("in/bad.php").write_binary(b"<?php echo '\xFF';\n")?;
    temp.child("in/good.php").write_str("<?php echo 1 ;\n")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "in", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.php"))
        .stderr(predicate::str::contains("could not be processed"));

    temp.child("out/good.php").assert("<?php echo 1;\n");

    Ok(())
}

#[test]
fn missing_input_is_a_configuration_error() -> TestResult {
    let temp = assert_fs::TempDir::new()?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "nope", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must exist"));

    temp.child("out").assert(predicate::path::missing());

    Ok(())
}

#[test]
fn output_file_is_rejected() -> TestResult {
    let temp = assert_fs::TempDir::new()?;
    temp.child("in/a.php").write_str("<?php\n")?;
    temp.child("out").write_str("already a file")?;

    let mut cmd = cargo_bin_cmd!("poptimizer");
    cmd.current_dir(&temp)
        .args(["-i", "in", "-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a folder"));

    Ok(())
}
