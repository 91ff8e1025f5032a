use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use dish_dashboard::{
    api::HttpDishApi, config::DashboardConfig, dashboard::Dashboard, live::SocketIoChannel,
    render::Renderer,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use commands::{Command, Input};

mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the dashboard
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(std::io::stderr().is_terminal())
        .with_file(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let config = DashboardConfig::from_env()?;
    let live = SocketIoChannel::new(&config.base_url)?;
    let api = HttpDishApi::new(config)?;
    tracing::info!(
        "using dish api at {} (timeout {:?}), live updates at {}",
        api.config().base_url,
        api.config().request_timeout,
        live.url()
    );
    let screen = Screen::new();

    let mut dashboard = Dashboard::mount(Arc::new(api), &live);
    screen.draw(&dashboard)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            change = dashboard.next_change() => {
                if change.needs_redraw() {
                    screen.draw(&dashboard)?;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = line.context("fail to read stdin")?;
                match Input::new(line.as_deref()) {
                    Input::Blank => {}
                    Input::Closed => {
                        // keep following live updates until Ctrl-C
                        tracing::info!("stdin closed, press Ctrl-C to quit");
                        stdin_open = false;
                    }
                    Input::Invalid(hint) => eprintln!("{hint}\n\n{}", commands::USAGE),
                    Input::Command(Command::Quit) => break,
                    Input::Command(Command::Help) => println!("{}", commands::USAGE),
                    Input::Command(Command::Toggle(target)) => match target.resolve(&dashboard) {
                        Some(id) => {
                            dashboard.toggle_dish(&id);
                            screen.draw(&dashboard)?;
                        }
                        None => eprintln!("no {target} on the dashboard"),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    dashboard.unmount();
    Ok(())
}

struct Screen {
    renderer: Renderer,
    interactive: bool,
}

impl Screen {
    fn new() -> Self {
        let interactive = std::io::stdout().is_terminal();
        let renderer = Renderer {
            styled: interactive,
            ..Renderer::default()
        };
        Self {
            renderer,
            interactive,
        }
    }

    fn draw(&self, dashboard: &Dashboard) -> anyhow::Result<()> {
        let width = crossterm::terminal::size()
            .map(|(columns, _)| columns as usize)
            .unwrap_or(80);
        let page = self.renderer.render(&dashboard.view(), width);

        let mut stdout = std::io::stdout().lock();
        if self.interactive {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))
                .context("fail to clear the screen")?;
        }
        write!(stdout, "{page}\n(toggle <n>, help, quit) > ")?;
        stdout.flush()?;
        Ok(())
    }
}
