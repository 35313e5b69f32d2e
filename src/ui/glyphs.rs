#[derive(Clone, Copy, Debug)]
pub struct Glyphs {
    pub selected: &'static str,
    pub unselected: &'static str,
    pub cursor: &'static str,
    pub busy: &'static str,
    pub arrow_left: &'static str,
    pub arrow_right: &'static str,
}

pub fn select(fancy_requested: bool) -> Glyphs {
    if fancy_requested {
        fancy()
    } else {
        ascii()
    }
}

fn ascii() -> Glyphs {
    Glyphs {
        selected: "[x]",
        unselected: "[ ]",
        cursor: "_",
        busy: "...",
        arrow_left: "<",
        arrow_right: ">",
    }
}

fn fancy() -> Glyphs {
    Glyphs {
        selected: "●",
        unselected: "○",
        cursor: "█",
        busy: "⏳",
        arrow_left: "←",
        arrow_right: "→",
    }
}
