//! End-to-end test: parameter file, staff database, work-package
//! definition, and progress report through loading, costing, earned
//! value, and report emission.

use std::fs;
use std::path::PathBuf;

use costwise_core::costing;
use costwise_core::loader;
use costwise_core::report::ReportSuite;
use costwise_core::{CostModel, EconomicParameters, ProgressLedger};

struct Inputs {
    _dir: tempfile::TempDir,
    params: PathBuf,
    staff_db: PathBuf,
    work_package: PathBuf,
    progress: PathBuf,
    report_dir: PathBuf,
}

fn write_inputs() -> Inputs {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let path = |name: &str| dir.path().join(name);

    let params = path("params.csv");
    fs::write(
        &params,
        "Issue date,01-Apr-24\n\
         Inflation,1%,2%,1\n\
         VAT,20%\n\
         WorkingMargin,10%,1\n\
         Contingency,20%,30%,40%,1\n\
         fEC,80%,80%\n",
    )
    .expect("params file should write");

    let staff_db = path("staff.csv");
    fs::write(
        &staff_db,
        "Institute code,Staff code,Name or post,Grade,Annual cost,Funding,Comment\n\
         Imperial-Physics,A1,J. Smith,Lecturer,100,Project,\n\
         Imperial-Physics,B2,Post TBC,RA,80,CG,to be hired\n",
    )
    .expect("staff database should write");

    let work_package = path("WP1.csv");
    fs::write(
        &work_package,
        "Project,Laser Hub\n\
         Work package,Accelerator\n\
         Manager,,R. Manager\n\
         Years,,2024/25,2025/26,Total\n\
         Task,Design\n\
         Institute,Imperial-Physics\n\
         Staff,A1,,,,,,,,0.25,0.25,0.25,0.25,0.5,0.5,0.5,0.5\n\
         Staff,B2,,,,,,,,0.5,0.5,0.5,0.5,0,0,0,0\n\
         EndStaff\n\
         Equipment,Magnet,10,20\n\
         EquipEnd\n\
         NonStaffHd\n\
         Consume,,3,4\n\
         Travel,,1,2\n\
         OtherNonStaff,Licences,2,3\n\
         NonStaffEnd\n\
         Flag\n\
         Gibberish,ignored\n",
    )
    .expect("work-package definition should write");

    let progress = path("progress.csv");
    fs::write(
        &progress,
        "Work package,Accelerator\n\
         ProgressLine,Design,,17 June 2025,0.5,30,0.4,28\n\
         Oddity,skipped\n",
    )
    .expect("progress report should write");

    let report_dir = dir.path().join("reports");
    Inputs {
        params,
        staff_db,
        work_package,
        progress,
        report_dir,
        _dir: dir,
    }
}

#[test]
fn full_run_from_files_to_reports() {
    let inputs = write_inputs();

    let params =
        EconomicParameters::from_file(&inputs.params).expect("parameters should load");
    assert_eq!(params.inflation_start_year, 0);

    let mut model = CostModel::new();
    let staff_count = loader::load_staff_database(&mut model, &inputs.staff_db)
        .expect("staff database should load");
    assert_eq!(staff_count, 2);

    let wp = loader::load_work_package(&mut model, &inputs.work_package)
        .expect("work-package definition should load");

    costing::run(&mut model, &params).expect("costing pass should succeed");

    let wp_entry = model.work_package(wp).expect("work package should be live");
    assert_eq!(wp_entry.financial_years, vec!["2024/25", "2025/26"]);

    // A1: 100 × [0.25, 0.5]; B2 (CG): 80 × [0.5, 0].
    assert_eq!(wp_entry.staff_cost_by_year, vec![65.0, 50.0]);
    assert_eq!(wp_entry.cg_staff_cost_by_year, vec![40.0, 0.0]);
    assert_eq!(wp_entry.staff_fraction_by_year, vec![0.75, 0.5]);
    assert_eq!(wp_entry.equipment_cost_by_year, vec![10.0, 20.0]);
    // Consumables absorb the other-non-staff row: [3+2, 4+3].
    assert_eq!(wp_entry.consumables_by_year, vec![5.0, 7.0]);
    assert_eq!(wp_entry.travel_by_year, vec![1.0, 2.0]);
    assert_eq!(wp_entry.other_non_staff_cost_by_year, vec![2.0, 3.0]);

    // Working margin: (staff + equipment) × 0.1.
    assert!((wp_entry.working_margin_by_year[0] - 7.5).abs() < 1e-9);
    assert!((wp_entry.working_margin_by_year[1] - 7.0).abs() < 1e-9);

    // Contingency: equipment × 0.2; (staff − CG) × 0.3 + CG × 0.4.
    assert!((wp_entry.contingency.equipment_by_year[0] - 2.0).abs() < 1e-9);
    assert!((wp_entry.contingency.all_staff_by_year[0] - 23.5).abs() < 1e-9);
    assert!((wp_entry.contingency.all_staff_by_year[1] - 15.0).abs() < 1e-9);
    assert!((wp_entry.contingency.cg_staff_by_year[0] - 16.0).abs() < 1e-9);

    // Inflation compounds by array index from the first year onward.
    assert!((wp_entry.inflation_by_year[0] - 0.0).abs() < 1e-9);
    let expected_inflation = (1.01_f64 - 1.0) * 20.0 + (1.02_f64 - 1.0) * 50.0;
    assert!((wp_entry.inflation_by_year[1] - expected_inflation).abs() < 1e-9);

    // Total: staff + equipment + other-non-staff + travel + consumables
    // + margin + equipment and all-staff contingency (no inflation).
    assert!((wp_entry.total_cost_by_year[0] - 116.0).abs() < 1e-9);
    assert!((wp_entry.total_cost_by_year[1] - 108.0).abs() < 1e-9);
    assert!((wp_entry.grand_total - 224.0).abs() < 1e-9);

    let (_, project) = model
        .project_entries()
        .next()
        .expect("project should exist");
    assert_eq!(project.name, "Laser Hub");
    assert!((project.total_cost() - wp_entry.grand_total).abs() < 1e-9);

    // Progress: the Design task is worth 115 staff + 30 equipment = 145.
    let mut ledger = ProgressLedger::new();
    let loaded = loader::load_progress(&model, &mut ledger, &inputs.progress)
        .expect("progress report should load");
    assert_eq!(loaded, 1);

    let series = ledger.rollup_work_package(&model, wp);
    assert_eq!(series.len(), 1);
    let (rolled, mut earned) = series.into_iter().next().expect("one date group");
    assert_eq!(rolled.fraction_complete, Some(0.4));
    let value = earned
        .value(&model, &ledger)
        .expect("earned value should compute");
    assert!((value - 145.0 * 0.4).abs() < 1e-9);

    // Reports land in the target directory.
    let suite = ReportSuite::new(&inputs.report_dir).expect("report dir should create");
    let written = suite
        .write_all(&model, &ledger)
        .expect("reports should write");
    assert!(written.iter().all(|path| path.is_file()));
    assert!(inputs.report_dir.join("WorkPackageList.csv").is_file());
    assert!(inputs.report_dir.join("WP1.csv").is_file());
    assert!(inputs.report_dir.join("Overview.csv").is_file());
    assert!(inputs.report_dir.join("ProgressSeries.csv").is_file());

    let list = fs::read_to_string(inputs.report_dir.join("WorkPackageList.csv"))
        .expect("report should read back");
    assert!(list.contains("Accelerator"));
    assert!(list.contains("224.000"));

    // An explicit reset leaves the store empty for the next run.
    model.reset();
    ledger.reset();
    assert_eq!(model.work_package_entries().count(), 0);
    assert_eq!(ledger.records().count(), 0);
}

#[test]
fn unknown_staff_become_placeholder_entries() {
    let dir = tempfile::tempdir().expect("temp dir should create");
    let definition = dir.path().join("WP2.csv");
    fs::write(
        &definition,
        "Project,Laser Hub\n\
         Work package,Beamline\n\
         Manager,,S. Manager\n\
         Years,,2024/25,Total\n\
         Task,Survey\n\
         Institute,Imperial-Physics\n\
         Staff,Z9,,,,,,,,0.25,0.25,0.25,0.25\n",
    )
    .expect("definition should write");

    let mut model = CostModel::new();
    loader::load_work_package(&mut model, &definition).expect("definition should load");

    let placeholder = model
        .find_staff("Imperial-Physics", "Z9")
        .expect("lookup should succeed")
        .expect("placeholder should exist");
    let placeholder = model.staff(placeholder).expect("placeholder should be live");
    assert!(placeholder.comments.contains("placeholder"));
    assert!((placeholder.annual_cost - 100.0).abs() < 1e-12);

    costing::run(&mut model, &EconomicParameters::default())
        .expect("costing should succeed");
    let (_, task) = model.task_entries().next().expect("task should exist");
    assert_eq!(task.staff_cost_by_year, vec![25.0]);
}

#[test]
fn missing_work_package_file_is_fatal() {
    let mut model = CostModel::new();
    let error = loader::load_work_package(&mut model, std::path::Path::new("/nonexistent/wp.csv"))
        .expect_err("missing file should fail");
    assert!(matches!(error, loader::LoaderError::FileNotFound { .. }));
}
