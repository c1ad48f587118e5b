fn main() {
    smallsh::shell_main()
}
