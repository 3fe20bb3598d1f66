use std::io::{self, Write};

use console::{style, StyledObject};

use crate::api::SearchResult;

fn marker() -> StyledObject<&'static str> {
    style("=>").magenta().bold()
}

fn label(text: &str) -> StyledObject<&str> {
    style(text).white().bold()
}

pub fn result_line(index: usize, result: &SearchResult) -> String {
    format!(
        "{} - {} ({})",
        style(format!("{}. {}", index, result.artist)).magenta().bold(),
        style(&result.title).yellow().bold(),
        result.album
    )
}

pub fn prompt_line() -> String {
    format!(
        "\n{} {} (ex.: 1-3,7): ",
        marker(),
        label("Which tracks to download?")
    )
}

pub fn print_searching(query: &str) {
    println!("{} {} {}", marker(), label("Searching:"), query);
}

pub fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        println!("{}", result_line(i + 1, result));
    }
}

pub fn print_prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt_line())?;
    stdout.flush()
}

pub fn print_downloading(name: &str) {
    println!(
        " {} {}",
        style("* Downloading:").black().bright().bold(),
        label(name)
    );
}

pub fn print_done() {
    println!("{} {}", marker(), label("Done!"));
}

pub fn error_line(message: &str) -> String {
    format!("{} {}", style("ERROR:").magenta().bold(), message)
}

/// Printed on stdout next to the other status lines.
pub fn print_error(message: &str) {
    println!("{}", error_line(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_result_line() {
        console::set_colors_enabled(false);
        let result = SearchResult {
            artist: "Yousei Teikoku".into(),
            title: "Kuusou Mesorogiwi".into(),
            album: "Mirai Nikki OP".into(),
            hash: "h".into(),
        };
        assert_eq!(
            result_line(3, &result),
            "3. Yousei Teikoku - Kuusou Mesorogiwi (Mirai Nikki OP)"
        );
        assert_eq!(
            error_line("Received 403 from server."),
            "ERROR: Received 403 from server."
        );
        assert_eq!(
            prompt_line(),
            "\n=> Which tracks to download? (ex.: 1-3,7): "
        );
    }
}
