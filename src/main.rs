fn main() {
    pawnstorm::uci::run();
}
