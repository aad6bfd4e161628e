use minesweeper_client::{
    ClientConfig, Coord, GameEvent, Intent, MinesweeperGame, Phase, Session, Tile,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const APERTURE: Coord = (20, 10);
const MINIMAP: Coord = (10, 5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let game = MinesweeperGame::new(ClientConfig::from_env());
    let (_, mut events) = game.subscribe().await;

    game.connect().await?;
    game.resize_aperture(APERTURE).await;
    println!("Connected to {}", game.config().address());
    println!("Type a key name per line (hjkl/wasd/yubn to move, enter to dig, f to flag, q to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    GameEvent::Initialized { size, players } => {
                        println!("🎮 {}x{} board, {} players", size.width, size.height, players);
                    }
                    GameEvent::BoardUpdated | GameEvent::ViewChanged => {
                        display(&game.get_state().await);
                    }
                    GameEvent::Detonated => {
                        display(&game.get_state().await);
                        println!("💣 BOOM!");
                    }
                    GameEvent::StatusText { text } => println!("{}", text),
                    GameEvent::ConnectionLost { reason } => {
                        let reason = reason.map(|r| format!(": {r}")).unwrap_or_default();
                        println!("🔌 Connection lost{}", reason);
                        break;
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let key = match line.trim() {
                    "" => "enter",
                    other => other,
                };
                match Intent::from_key(key) {
                    Some(intent) => {
                        if !game.handle_intent(intent).await? {
                            return Ok(());
                        }
                    }
                    None => println!("Unknown key: {}", key),
                }
            }
        }
    }

    game.disconnect().await?;
    Ok(())
}

/// Print the aperture with a border past the board edges, and the minimap.
fn display(session: &Session) {
    let Some(board) = session.board() else {
        return;
    };
    let viewport = session.viewport();
    let minimap = viewport.minimap(MINIMAP);
    let (aperture_w, aperture_h) = viewport.aperture_size();

    for ay in 0..aperture_h {
        let mut row = String::new();
        for ax in 0..aperture_w {
            let (x, y) = viewport.aperture_to_board((ax, ay));
            let tile = usize::try_from(x)
                .ok()
                .zip(usize::try_from(y).ok())
                .and_then(|(x, y)| board.get(x, y).ok());
            let symbol = match tile {
                _ if (x, y) == viewport.selection() => '@',
                None => '#',
                Some(Tile::Untouched) => '·',
                Some(tile) => tile.glyph(),
            };
            row.push(symbol);
        }

        if let Some(minimap) = &minimap {
            row.push_str("   ");
            if ay < minimap.size().1 {
                for mx in 0..minimap.size().0 {
                    row.push(if (mx, ay) == minimap.selection() {
                        '@'
                    } else if minimap.is_inside_aperture((mx, ay)) {
                        '+'
                    } else {
                        '.'
                    });
                }
            }
        }
        println!("{}", row);
    }

    if session.phase() == Phase::Detonated {
        println!("(no more digging)");
    }
}
