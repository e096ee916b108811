// cognate-cv/tests/cross_validation_test.rs
//
// End-to-end checks of sample materialization and the batch driver, with
// raxml-ng replaced by a recording runner that fakes its result files.

use cognate_cv::cv::{create_samples, split_indices, SamplePaths, Split};
use cognate_cv::cv_opt::CvOpt;
use cognate_cv::error::CvError;
use cognate_cv::experiment::run_experiment;
use cognate_cv::io::phylip::{read_phylip, write_phylip_file, Alignment, Record};
use cognate_cv::results::raxml_file;
use cognate_cv::runner::testing::RecordingRunner;
use cognate_cv::runner::Invocation;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LANGUAGES: [&str; 4] = ["English", "German", "Dutch", "Swedish"];

// Collapsed alignment: site s of language l is a digit derived from both,
// expanded alignment: each site spelled out as kappa binary columns.
fn make_dataset(num_sites: usize, kappa: usize) -> (Alignment, Alignment) {
    let mut collapsed = Vec::new();
    let mut expanded = Vec::new();
    for (l, id) in LANGUAGES.iter().enumerate() {
        let states: Vec<usize> = (0..num_sites).map(|s| (s * 7 + l * 3) % (1 << kappa)).collect();
        collapsed.push(Record {
            id: id.to_string(),
            seq: states.iter().map(|&v| b'0' + v as u8).collect(),
        });
        expanded.push(Record {
            id: id.to_string(),
            seq: states
                .iter()
                .flat_map(|&v| (0..kappa).rev().map(move |b| if v >> b & 1 == 1 { b'1' } else { b'0' }))
                .collect(),
        });
    }
    (Alignment::new(collapsed), Alignment::new(expanded))
}

fn write_dataset(msa_dir: &Path, opt: &CvOpt, num_sites: usize) -> io::Result<()> {
    let (collapsed, expanded) = make_dataset(num_sites, opt.kappa);
    let paths = SamplePaths::new(msa_dir, opt);
    write_phylip_file(&paths.prototype_source(), &collapsed).map_err(to_io)?;
    write_phylip_file(&paths.bin_source(), &expanded).map_err(to_io)?;
    Ok(())
}

fn to_io(e: CvError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

fn small_opt(root: &Path) -> CvOpt {
    let mut opt = CvOpt::default();
    opt.kappa = 2;
    opt.num_samples = 3;
    opt.msa_super_dir = root.join("msa");
    opt.raxmlng_super_dir = root.join("cross_validation");
    opt.plots_super_dir = root.join("plots");
    opt
}

#[test]
fn test_fold_outputs_preserve_column_counts() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let msa_dir = opt.msa_super_dir.join("ielex");
    write_dataset(&msa_dir, &opt, 17)?;

    let mut rng = StdRng::seed_from_u64(opt.seed);
    let folds = create_samples(&msa_dir, &opt, &mut rng).map_err(to_io)?;
    assert_eq!(folds, 3);

    let paths = SamplePaths::new(&msa_dir, &opt);
    for t in 0..folds {
        let c_train = read_phylip(&paths.prototype_sample(Split::Train, t)).map_err(to_io)?;
        let c_test = read_phylip(&paths.prototype_sample(Split::Test, t)).map_err(to_io)?;
        let e_train = read_phylip(&paths.bin_sample(Split::Train, t)).map_err(to_io)?;
        let e_test = read_phylip(&paths.bin_sample(Split::Test, t)).map_err(to_io)?;

        assert_eq!(c_train.num_columns(), 11, "ceil(17 * 0.6) train sites");
        assert_eq!(c_train.num_columns() + c_test.num_columns(), 17);
        assert_eq!(e_train.num_columns(), 2 * c_train.num_columns());
        assert_eq!(e_test.num_columns(), 2 * c_test.num_columns());
        for a in [&c_train, &c_test, &e_train, &e_test] {
            assert_eq!(a.ids().collect::<Vec<_>>(), LANGUAGES.to_vec());
        }
    }
    Ok(())
}

#[test]
fn test_train_and_test_columns_reassemble_the_source() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let msa_dir = opt.msa_super_dir.join("abvd");
    write_dataset(&msa_dir, &opt, 23)?;
    let (collapsed, _) = make_dataset(23, opt.kappa);

    // Replay the sampler with the same seed to recover the partitions
    let mut rng = StdRng::seed_from_u64(99);
    create_samples(&msa_dir, &opt, &mut rng).map_err(to_io)?;
    let mut replay = StdRng::seed_from_u64(99);
    let partitions = split_indices(23, opt.num_samples, opt.ratio, &mut replay).map_err(to_io)?;

    let paths = SamplePaths::new(&msa_dir, &opt);
    for (t, p) in partitions.iter().enumerate() {
        let train = read_phylip(&paths.prototype_sample(Split::Train, t)).map_err(to_io)?;
        let test = read_phylip(&paths.prototype_sample(Split::Test, t)).map_err(to_io)?;

        let mut train_sites: Vec<usize> = p.train_indices().to_vec();
        train_sites.sort_unstable();
        let test_sites = p.test_indices();

        let mut rebuilt = Alignment::empty_like(&collapsed);
        for s in 0..23 {
            let (src, col) = match train_sites.binary_search(&s) {
                Ok(i) => (&train, i),
                Err(_) => (&test, test_sites.binary_search(&s).unwrap()),
            };
            rebuilt.append_columns(src, col..col + 1);
        }
        assert_eq!(rebuilt, collapsed, "fold {t}");
    }
    Ok(())
}

#[test]
fn test_same_seed_gives_identical_files() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let first = opt.msa_super_dir.join("run1");
    let second = opt.msa_super_dir.join("run2");
    write_dataset(&first, &opt, 64)?;
    write_dataset(&second, &opt, 64)?;

    create_samples(&first, &opt, &mut StdRng::seed_from_u64(5)).map_err(to_io)?;
    create_samples(&second, &opt, &mut StdRng::seed_from_u64(5)).map_err(to_io)?;

    let a = SamplePaths::new(&first, &opt);
    let b = SamplePaths::new(&second, &opt);
    for t in 0..opt.num_samples {
        for split in Split::ALL {
            assert_eq!(fs::read(a.bin_sample(split, t))?, fs::read(b.bin_sample(split, t))?);
            assert_eq!(
                fs::read(a.prototype_sample(split, t))?,
                fs::read(b.prototype_sample(split, t))?
            );
        }
    }
    Ok(())
}

#[test]
fn test_zero_site_dataset() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let msa_dir = opt.msa_super_dir.join("empty");
    write_dataset(&msa_dir, &opt, 0)?;

    let folds = create_samples(&msa_dir, &opt, &mut StdRng::seed_from_u64(1)).map_err(to_io)?;
    let paths = SamplePaths::new(&msa_dir, &opt);
    for t in 0..folds {
        let a = read_phylip(&paths.bin_sample(Split::Test, t)).map_err(to_io)?;
        assert_eq!(a.num_sequences(), 4);
        assert_eq!(a.num_columns(), 0);
    }
    Ok(())
}

#[test]
fn test_column_mismatch_writes_nothing() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let msa_dir = opt.msa_super_dir.join("broken");
    let paths = SamplePaths::new(&msa_dir, &opt);
    fs::create_dir_all(&msa_dir)?;
    fs::write(paths.prototype_source(), " 2 4\na 0123\nb 3210\n")?;
    fs::write(paths.bin_source(), " 2 7\na 0001101\nb 1110010\n")?;

    let err = create_samples(&msa_dir, &opt, &mut StdRng::seed_from_u64(2)).unwrap_err();
    assert!(matches!(err, CvError::ColumnMismatch { expanded: 7, kappa: 2, collapsed: 4 }));
    assert!(err.is_dataset_local());

    let entries = fs::read_dir(&msa_dir)?.count();
    assert_eq!(entries, 2, "only the two source files remain");
    Ok(())
}

#[test]
fn test_malformed_source_is_dataset_local() -> io::Result<()> {
    let dir = TempDir::new()?;
    let opt = small_opt(dir.path());
    let msa_dir = opt.msa_super_dir.join("garbled");
    let paths = SamplePaths::new(&msa_dir, &opt);
    fs::create_dir_all(&msa_dir)?;
    fs::write(paths.prototype_source(), " 2 4\na 0123\n")?;
    fs::write(paths.bin_source(), " 2 8\na 00011011\nb 11100100\n")?;

    let err = create_samples(&msa_dir, &opt, &mut StdRng::seed_from_u64(2)).unwrap_err();
    assert!(matches!(err, CvError::Malformed { .. }));
    assert!(err.is_dataset_local());
    Ok(())
}

// Fake raxml-ng: every run leaves a log, inference also leaves a tree and model
fn fake_raxml(inv: &Invocation) {
    let prefix = PathBuf::from(inv.value_of("--prefix").unwrap());
    let evaluate = inv.has_arg("--evaluate");
    let llh = if evaluate { -40.0 } else { -60.0 };
    fs::write(
        raxml_file(&prefix, "log"),
        format!("RAxML-NG\nFinal LogLikelihood: {llh}\n"),
    )
    .unwrap();
    if !evaluate {
        let model = inv.value_of("--model").unwrap();
        fs::write(raxml_file(&prefix, "bestTree"), "(English,German,(Dutch,Swedish));\n").unwrap();
        fs::write(raxml_file(&prefix, "bestModel"), format!("{model}+G4m{{1.0}},noname = 1-10\n")).unwrap();
    }
}

#[test]
fn test_batch_trains_evaluates_and_summarises() -> io::Result<()> {
    let dir = TempDir::new()?;
    let mut opt = small_opt(dir.path());
    opt.run_train = true;
    opt.run_evaluate = true;

    // 10 sites at ratio 0.6: 6 train sites, 4 test sites
    write_dataset(&opt.msa_super_dir.join("b_good"), &opt, 10)?;
    // Second dataset lacks its binary source and is ignored
    let lonely = opt.msa_super_dir.join("c_incomplete");
    fs::create_dir_all(&lonely)?;
    fs::write(lonely.join("prototype_part_2.phy"), " 1 1\na 0\n")?;
    // Third dataset violates the encoding precondition and is skipped
    let broken = opt.msa_super_dir.join("a_broken");
    fs::create_dir_all(&broken)?;
    fs::write(broken.join("prototype_part_2.phy"), " 1 2\na 01\n")?;
    fs::write(broken.join("bin_part_2.phy"), " 1 3\na 001\n")?;

    let mut runner = RecordingRunner::with_hook(fake_raxml);
    let summaries = run_experiment(&opt, &mut runner).map_err(to_io)?;

    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.name, "b_good");
    // -60 over 6 train sites and -40 over 4 test sites, for every model
    for v in s.means {
        assert!((v - (-10.0)).abs() < 1e-12, "mean {v}");
    }
    for d in s.differences {
        assert!(d.abs() < 1e-12, "difference {d}");
    }

    // 3 folds x 4 models, trained then evaluated
    assert_eq!(runner.invocations.len(), 24);
    let evaluations = runner
        .invocations
        .iter()
        .filter(|i| i.has_arg("--evaluate"))
        .count();
    assert_eq!(evaluations, 12);

    assert!(opt.plots_super_dir.join("2").join("b_good.svg").is_file());
    assert!(!opt.raxmlng_super_dir.join("a_broken").exists());
    Ok(())
}

#[test]
fn test_batch_without_results_reports_nan() -> io::Result<()> {
    let dir = TempDir::new()?;
    let mut opt = small_opt(dir.path());
    opt.make_plots = false;
    write_dataset(&opt.msa_super_dir.join("ielex"), &opt, 12)?;

    let mut runner = RecordingRunner::new();
    let summaries = run_experiment(&opt, &mut runner).map_err(to_io)?;
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].means.iter().all(|v| v.is_nan()));
    assert!(runner.invocations.is_empty());
    assert!(!opt.plots_super_dir.exists());
    Ok(())
}

#[test]
fn test_batch_rejects_invalid_ratio() {
    let dir = TempDir::new().unwrap();
    let mut opt = small_opt(dir.path());
    opt.ratio = 1.5;
    let mut runner = RecordingRunner::new();
    assert!(matches!(
        run_experiment(&opt, &mut runner),
        Err(CvError::Config(_))
    ));
}
