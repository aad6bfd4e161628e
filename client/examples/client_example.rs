use minesweeper_client::{
    ClientConfig, ClientMessage, MinesweeperConnection, Pos, ServerMessage, Session,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Connect to the server named by MINESWEEPER_HOST / MINESWEEPER_PORT
    let config = ClientConfig::from_env();
    let mut connection = MinesweeperConnection::connect(&config.address()).await?;
    let mut session = Session::new();

    // The greeting always comes first
    if let Some(message) = connection.receive_message().await? {
        if let ServerMessage::Greeting { size, players } = &message {
            println!(
                "Joined a {}x{} board with {} players",
                size.width, size.height, players
            );
        }
        session.apply(message);
    }

    // Ask for the board and print it
    connection.send_message(ClientMessage::Look)?;
    receive_board(&mut connection, &mut session).await?;

    // Dig the corner
    connection.send_message(ClientMessage::Dig { pos: Pos::new(0, 0) })?;
    println!("Sent dig for position (0, 0)");
    receive_board(&mut connection, &mut session).await?;

    // Flag a neighbour if it is still untouched
    session.move_selection((1, 1));
    if let Some(command) = session.toggle_flag() {
        println!("Sending: {}", command);
        connection.send_message(command)?;
        receive_board(&mut connection, &mut session).await?;
    }

    // Close the connection
    connection.send_message(ClientMessage::Bye)?;
    connection.close().await?;
    println!("Connection closed");

    Ok(())
}

/// Print every message until the next board arrives.
async fn receive_board(
    connection: &mut MinesweeperConnection,
    session: &mut Session,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    while let Some(message) = connection.receive_message().await? {
        let is_board = matches!(message, ServerMessage::BoardDump { .. });
        match &message {
            ServerMessage::BoardDump { board } => {
                for row in board.rows() {
                    println!("  {}", row);
                }
            }
            ServerMessage::Detonation => println!("BOOM!"),
            ServerMessage::StatusText { text } => println!("Server: {}", text),
            ServerMessage::Greeting { .. } => println!("Unexpected greeting"),
        }
        session.apply(message);
        if is_board {
            return Ok(());
        }
    }

    println!("Server closed the connection");
    Ok(())
}
