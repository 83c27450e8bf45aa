use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use galore_inrank::{
    GaLoreAdamW, GaLoreSettings, Gradient, OptimizerConfig, ParamGroup, ParamId, Parameter,
};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, ArrayD, Ix2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 저차원 목표 행렬 `U · V` 생성
fn low_rank_target(rng: &mut StdRng, rows: usize, cols: usize, rank: usize) -> Array2<f32> {
    let u = Array2::from_shape_fn((rows, rank), |_| rng.gen_range(-1.0f32..1.0));
    let v = Array2::from_shape_fn((rank, cols), |_| rng.gen_range(-1.0f32..1.0));
    u.dot(&v)
}

/// 0.5 * ||W - T||² 와 그 그래디언트 `W - T`
fn loss_and_grad(weight: &ArrayD<f32>, target: &Array2<f32>) -> Result<(f32, Array2<f32>)> {
    let weight = weight
        .view()
        .into_dimensionality::<Ix2>()
        .context("weight must be a 2-D tensor")?;
    let diff = &weight - target;
    let loss = 0.5 * diff.iter().map(|d| d * d).sum::<f32>();
    Ok((loss, diff))
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("GaLore InRank demo")
        .version("0.1.0")
        .about("저차원 목표 행렬을 GaLore AdamW (InRank) 로 학습")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("JSON 설정 파일 (optimizer / inrank)"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_name("N")
                .help("가중치 행 수")
                .default_value("64"),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_name("N")
                .help("가중치 열 수")
                .default_value("32"),
        )
        .arg(
            Arg::new("target-rank")
                .long("target-rank")
                .value_name("R")
                .help("목표 행렬의 rank")
                .default_value("4"),
        )
        .arg(
            Arg::new("steps")
                .long("steps")
                .short('s')
                .value_name("STEPS")
                .help("학습 스텝 수")
                .default_value("300"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("난수 시드")
                .default_value("42"),
        )
        .arg(
            Arg::new("print-config")
                .long("print-config")
                .action(ArgAction::SetTrue)
                .help("사용할 설정을 JSON 으로 출력하고 종료"),
        )
        .get_matches();

    let settings = match matches.get_one::<String>("config") {
        Some(path) => GaLoreSettings::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => GaLoreSettings {
            optimizer: OptimizerConfig::new().with_learning_rate(0.05),
            ..GaLoreSettings::default()
        },
    };
    if matches.get_flag("print-config") {
        println!("{}", settings.to_json_string()?);
        return Ok(());
    }

    let parse = |name: &str| -> Result<usize> {
        let raw = matches
            .get_one::<String>(name)
            .with_context(|| format!("missing --{}", name))?;
        raw.parse::<usize>()
            .with_context(|| format!("--{} must be a non-negative integer, got {}", name, raw))
    };
    let rows = parse("rows")?;
    let cols = parse("cols")?;
    let target_rank = parse("target-rank")?;
    let steps = parse("steps")?;
    let seed = parse("seed")? as u64;

    println!("🚀 GaLore InRank 데모");
    println!("   가중치: {}x{}, 목표 rank: {}, 스텝: {}", rows, cols, target_rank, steps);

    let mut rng = StdRng::seed_from_u64(seed);
    let target = low_rank_target(&mut rng, rows, cols, target_rank);
    let bias_target = Array2::from_shape_fn((1, cols), |_| rng.gen_range(-0.5f32..0.5));

    let groups = vec![
        ParamGroup::projection(
            "weights",
            vec![Parameter::new(ArrayD::zeros(ndarray::IxDyn(&[rows, cols])))],
            settings.optimizer.clone(),
            settings.inrank.clone(),
        ),
        ParamGroup::plain(
            "bias",
            vec![Parameter::new(ArrayD::zeros(ndarray::IxDyn(&[1, cols])))],
            settings.optimizer.clone(),
        ),
    ];
    let mut optimizer = GaLoreAdamW::new(groups)?;
    let weight_id = ParamId::new(0, 0);
    let bias_id = ParamId::new(1, 0);

    let pb = ProgressBar::new(steps as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("🔥 [{elapsed_precise}] [{bar:50.cyan/blue}] {pos:>4}/{len:4} ({percent:>3}%) {msg}")?
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    pb.set_message("학습 준비 중...");

    let mut first_loss = None;
    let mut last_loss = 0.0;
    for _ in 0..steps {
        let weight = optimizer
            .param(weight_id)
            .context("weight parameter missing")?
            .value
            .clone();
        let bias = optimizer
            .param(bias_id)
            .context("bias parameter missing")?
            .value
            .clone();

        let (weight_loss, weight_grad) = loss_and_grad(&weight, &target)?;
        let (bias_loss, bias_grad) = loss_and_grad(&bias, &bias_target)?;
        optimizer.set_grad(weight_id, Gradient::from(weight_grad.into_dyn()))?;
        optimizer.set_grad(bias_id, Gradient::from(bias_grad.into_dyn()))?;

        let loss = optimizer.step_with_closure(|| weight_loss + bias_loss)?;
        first_loss.get_or_insert(loss);
        last_loss = loss;

        pb.set_message(format!("loss {:.4}, rank {:?}", loss, optimizer.ranks()));
        pb.inc(1);
    }
    pb.finish_with_message("완료");

    println!("\n📊 결과");
    if let Some(first) = first_loss {
        println!("   손실: {:.6} -> {:.6}", first, last_loss);
    }
    for group in optimizer.groups() {
        let kind = if group.is_projection() { "프로젝션" } else { "일반" };
        println!("   그룹 '{}' ({}): 파라미터 {}개", group.name, kind, group.len());
    }
    let table = optimizer.rank_table();
    for index in 0..table.len() {
        if let (Some(rank), Some(ratio)) = (table.rank(index), table.explained_ratio(index)) {
            println!("   param {}: rank {}, 설명 비율 {:.4}", index, rank, ratio);
        }
    }

    Ok(())
}
