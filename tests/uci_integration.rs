//! Drives the engine binary over real stdin/stdout pipes.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

use pawnstorm::uci::parse_uci_move;
use pawnstorm::Position;

struct Engine {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
}

impl Engine {
    fn spawn() -> Self {
        let exe = env!("CARGO_BIN_EXE_pawnstorm");
        let mut child = Command::new(exe)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("failed to spawn engine binary");
        let stdin = child.stdin.take().unwrap();
        let reader = BufReader::new(child.stdout.take().unwrap());
        Engine {
            child,
            stdin,
            reader,
        }
    }

    fn send(&mut self, command: &str) {
        self.stdin
            .write_all(format!("{command}\n").as_bytes())
            .expect("write to engine failed");
        self.stdin.flush().unwrap();
    }

    /// Read lines until one starts with `prefix`, returning everything read
    fn read_until(&mut self, prefix: &str) -> (String, String) {
        let mut transcript = String::new();
        loop {
            let mut line = String::new();
            let bytes = self.reader.read_line(&mut line).expect("read failed");
            assert_ne!(bytes, 0, "engine closed stdout before '{prefix}'");
            transcript.push_str(&line);
            if line.starts_with(prefix) {
                return (transcript, line);
            }
        }
    }

    fn quit(mut self) {
        self.send("quit");
        let _ = self.child.wait();
    }
}

#[test]
fn handshake_and_clocked_search() {
    let mut engine = Engine::spawn();
    engine.send("uci");
    let (transcript, _) = engine.read_until("uciok");
    assert!(transcript.contains("id name"));
    assert!(transcript.contains("option name Hash"));
    assert!(transcript.contains("option name Threads"));

    engine.send("isready");
    engine.read_until("readyok");

    engine.send("position startpos moves e2e4");
    engine.send("go movetime 100");
    let (transcript, bestmove) = engine.read_until("bestmove");
    assert!(transcript.contains("info depth"));
    assert!(transcript.contains(" pv "));

    let mv = bestmove.split_whitespace().nth(1).expect("bestmove payload");
    assert_ne!(mv, "0000");

    // The reported move must be legal in the position we sent
    let mut pos = Position::startpos();
    let e2e4 = parse_uci_move(&pos, "e2e4").unwrap();
    pos.do_move(e2e4);
    assert!(parse_uci_move(&pos, mv).is_ok(), "illegal bestmove {mv}");

    engine.quit();
}

#[test]
fn fixed_depth_search_reports_each_depth() {
    let mut engine = Engine::spawn();
    engine.send("position fen r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
    engine.send("go depth 5");
    let (transcript, _) = engine.read_until("bestmove");
    for depth in 1..=5 {
        assert!(
            transcript.contains(&format!("info depth {depth} ")),
            "missing depth {depth} report"
        );
    }
    engine.quit();
}

#[test]
fn stop_ends_an_infinite_search() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go infinite");
    std::thread::sleep(std::time::Duration::from_millis(100));
    engine.send("stop");
    let (_, bestmove) = engine.read_until("bestmove");
    assert!(bestmove.starts_with("bestmove "));
    engine.quit();
}

#[test]
fn go_perft_prints_the_node_count() {
    let mut engine = Engine::spawn();
    engine.send("position startpos");
    engine.send("go perft 3");
    let (transcript, total) = engine.read_until("Nodes searched:");
    assert!(transcript.contains("e2e4: 600"));
    assert!(total.trim().ends_with("8902"));
    engine.quit();
}

#[test]
fn setoption_and_new_game_are_accepted() {
    let mut engine = Engine::spawn();
    engine.send("setoption name Hash value 32");
    engine.send("setoption name Threads value 2");
    engine.send("ucinewgame");
    engine.send("isready");
    engine.read_until("readyok");

    engine.send("position startpos");
    engine.send("go depth 4");
    engine.read_until("bestmove");
    engine.quit();
}

#[test]
fn mated_position_reports_none() {
    let mut engine = Engine::spawn();
    // Black to move, already checkmated
    engine.send("position fen R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    engine.send("go depth 3");
    let (_, bestmove) = engine.read_until("bestmove");
    assert!(bestmove.contains("(none)"));
    engine.quit();
}
