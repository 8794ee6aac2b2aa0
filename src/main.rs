use color_eyre::eyre::{
    Result,
    eyre,
};
use minicasino::{
    BalanceCache,
    CrashRoundEngine,
    GameConfig,
    GameGateway,
    MinesSessionEngine,
    MinesStatus,
    api::ApiClient,
    crash::CrashPhase,
    ui::{
        self,
        TuiPresenter,
        UserEvent,
    },
};
use std::time::Duration;
use tokio::time;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

const FRAME_MILLIS: u64 = 16;

struct CliArgs {
    base_url: String,
    init_data: String,
    min_bet: Option<f64>,
    window_secs: Option<u32>,
    mines: Option<u32>,
}

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: minicasino --base-url <url> [--init-data <token>]\n\
         [--min-bet <amount>] [--window-secs <seconds>]\n\
         \n\
         Flags:\n\
           --base-url <url>       Game server endpoint, e.g. https://play.example.com\n\
           --init-data <token>    Auth token sent as X-Init-Data (or set MINICASINO_INIT_DATA)\n\
           --min-bet <amount>     Override the minimum stake (default 1.00)\n\
           --window-secs <secs>   Override the betting window countdown (default 10)\n\
           --mines <count>        Starting mine count for the Mines panel (default 3)"
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut base_url: Option<String> = None;
    let mut init_data: Option<String> = None;
    let mut min_bet: Option<f64> = None;
    let mut window_secs: Option<u32> = None;
    let mut mines: Option<u32> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--base-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--base-url requires a URL argument"))?;
                if base_url.is_some() {
                    return Err(eyre!("--base-url may only be specified once"));
                }
                base_url = Some(url);
            }
            "--init-data" => {
                let token = args
                    .next()
                    .ok_or_else(|| eyre!("--init-data requires a token argument"))?;
                if init_data.is_some() {
                    return Err(eyre!("--init-data may only be specified once"));
                }
                init_data = Some(token);
            }
            "--min-bet" => {
                let amount = args
                    .next()
                    .ok_or_else(|| eyre!("--min-bet requires an amount argument"))?;
                min_bet = Some(
                    amount
                        .parse()
                        .map_err(|_| eyre!("--min-bet expects a number, got {amount}"))?,
                );
            }
            "--window-secs" => {
                let secs = args
                    .next()
                    .ok_or_else(|| eyre!("--window-secs requires a seconds argument"))?;
                window_secs = Some(
                    secs.parse()
                        .map_err(|_| eyre!("--window-secs expects an integer, got {secs}"))?,
                );
            }
            "--mines" => {
                let count = args
                    .next()
                    .ok_or_else(|| eyre!("--mines requires a count argument"))?;
                mines = Some(
                    count
                        .parse()
                        .map_err(|_| eyre!("--mines expects an integer, got {count}"))?,
                );
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let base_url = base_url.ok_or_else(|| eyre!("--base-url is required"))?;
    let init_data = match init_data.or_else(|| std::env::var("MINICASINO_INIT_DATA").ok())
    {
        Some(token) => token,
        None => {
            return Err(eyre!(
                "no auth token; pass --init-data or set MINICASINO_INIT_DATA"
            ));
        }
    };
    Ok(CliArgs {
        base_url,
        init_data,
        min_bet,
        window_secs,
        mines,
    })
}

// The terminal owns stdout, so logs go to a rolling file instead.
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("logs", "minicasino.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("minicasino=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = parse_cli_args()?;
    let _log_guard = init_tracing();
    tracing::info!(base_url = %args.base_url, "starting minicasino client");

    let mut config = GameConfig::default();
    if let Some(min_bet) = args.min_bet {
        config.min_bet = min_bet;
    }
    if let Some(window_secs) = args.window_secs {
        config.betting_window_secs = window_secs;
    }

    let gateway = ApiClient::new(args.base_url, args.init_data)?;
    let balance = BalanceCache::new(0.0);

    let mut presenter = TuiPresenter::enter()?;
    if let Some(mines) = args.mines {
        presenter.mine_count_input = mines.clamp(config.mines_count_min, config.mines_count_max);
    }
    let res = run_loop(gateway, config, balance, &mut presenter).await;
    TuiPresenter::exit()?;
    res
}

async fn run_loop(
    gateway: ApiClient,
    config: GameConfig,
    balance: BalanceCache,
    presenter: &mut TuiPresenter,
) -> Result<()> {
    // Best-effort bootstrap; the cache stays at zero until the server
    // answers, which the precondition checks treat as "no funds".
    balance.refresh(&gateway).await;
    if let Ok(user) = gateway.user_info().await {
        presenter.username = user.username;
        if let Some(value) = user.balance {
            balance.set(value);
        }
    }

    let mut crash = CrashRoundEngine::new(gateway.clone(), config.clone(), balance.clone());
    let mut mines = MinesSessionEngine::new(gateway.clone(), config, balance.clone());

    presenter.redraw();

    let mut frame_ticker = time::interval(Duration::from_millis(FRAME_MILLIS));
    let mut second_ticker = time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = frame_ticker.tick() => {
                let token = crash.clock_token();
                crash.on_clock_tick(presenter, token).await;
            }
            _ = second_ticker.tick() => {
                crash.on_window_tick(presenter);
            }
            ev = ui::next_event(presenter) => {
                match ev? {
                    UserEvent::Quit => break,
                    UserEvent::CrashAction => {
                        if crash.phase() == CrashPhase::Running {
                            let _ = crash.cashout(presenter).await;
                        } else {
                            let bet = presenter.bet_input;
                            let auto = Some(presenter.auto_cashout_input);
                            let _ = crash.place_bet(presenter, bet, auto).await;
                        }
                    }
                    UserEvent::MinesAction => {
                        if mines.status() == MinesStatus::Active {
                            let _ = mines.cashout(presenter).await;
                        } else {
                            let bet = presenter.bet_input;
                            let count = presenter.mine_count_input;
                            let _ = mines.start_session(presenter, bet, count).await;
                        }
                    }
                    UserEvent::RevealSelected => {
                        let index = presenter.cursor;
                        let _ = mines.reveal(presenter, index).await;
                    }
                    UserEvent::RefreshBalance => {
                        balance.refresh(&gateway).await;
                        presenter.redraw();
                    }
                    UserEvent::SwitchPanel | UserEvent::Redraw => {
                        presenter.redraw();
                    }
                }
            }
        }
    }
    Ok(())
}
