fn main() {
    crivo::cli::run();
}
