fn main() -> eframe::Result<()> {
    hom_walker::native::run()
}
