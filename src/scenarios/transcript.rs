//! Keystroke transcripts for the gestion_stock main menu.

pub const MENU_ADD: &str = "1";
pub const MENU_LIST: &str = "2";
pub const MENU_DELETE: &str = "3";
pub const MENU_MODIFY: &str = "4";
pub const MENU_QUIT: &str = "0";
pub const CONFIRM_YES: &str = "o";

/// An ordered list of lines typed into the AUT, rendered newline-joined with
/// a trailing newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn add_product(self, name: &str, quantity: u32, price: &str) -> Self {
        self.line(MENU_ADD)
            .line(name)
            .line(quantity.to_string())
            .line(price)
    }

    pub fn list_products(self) -> Self {
        self.line(MENU_LIST)
    }

    /// List, then press Enter to leave the listing screen.
    pub fn list_and_return(self) -> Self {
        self.line(MENU_LIST).line("")
    }

    pub fn modify_product(self, id: u32, name: &str, quantity: u32, price: &str) -> Self {
        self.line(MENU_MODIFY)
            .line(id.to_string())
            .line(name)
            .line(quantity.to_string())
            .line(price)
    }

    pub fn delete_product(self, id: u32) -> Self {
        self.line(MENU_DELETE).line(id.to_string()).line(CONFIRM_YES)
    }

    pub fn quit(self) -> Self {
        self.line(MENU_QUIT)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_quit_renders_canonical_input() {
        let transcript = Transcript::new().add_product("Clavier", 25, "49.99").quit();
        assert_eq!(transcript.render(), "1\nClavier\n25\n49.99\n0\n");
    }

    #[test]
    fn full_journey_keeps_blank_return_line() {
        let transcript = Transcript::new()
            .add_product("Clavier", 25, "49.99")
            .list_and_return()
            .modify_product(7, "Clavier RGB", 50, "59.99")
            .delete_product(7)
            .quit();
        assert_eq!(
            transcript.lines(),
            [
                "1",
                "Clavier",
                "25",
                "49.99",
                "2",
                "",
                "4",
                "7",
                "Clavier RGB",
                "50",
                "59.99",
                "3",
                "7",
                "o",
                "0"
            ]
        );
    }
}
