use encoding_rs::WINDOWS_1250;

/// Decode a Windows-1250 (Central European) byte stream. The Polish bank
/// exports use this code page; malformed sequences are replaced rather
/// than failing the whole file.
pub fn decode_cp1250(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1250.decode(bytes);
    text.into_owned()
}

/// Fold accented characters to their closest ASCII letter and drop any
/// other non-ASCII character. Marker matching and rule authoring both
/// happen on the folded text, so the mapping must stay stable.
pub fn fold_to_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else if let Some(folded) = fold_char(c) {
            out.push_str(folded);
        }
    }
    out
}

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        // Polish diacritics, both cases.
        'ą' => "a",
        'ć' => "c",
        'ę' => "e",
        'ł' => "l",
        'ń' => "n",
        'ó' => "o",
        'ś' => "s",
        'ź' | 'ż' => "z",
        'Ą' => "A",
        'Ć' => "C",
        'Ę' => "E",
        'Ł' => "L",
        'Ń' => "N",
        'Ó' => "O",
        'Ś' => "S",
        'Ź' | 'Ż' => "Z",
        // Latin accents that show up in foreign contractor names.
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ò' | 'ô' | 'ö' | 'õ' => "o",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ç' | 'č' => "c",
        'ñ' => "n",
        'š' => "s",
        'ř' => "r",
        'ď' => "d",
        'ť' => "t",
        'ž' => "z",
        'ě' => "e",
        'ů' => "u",
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => "A",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'Ò' | 'Ô' | 'Ö' | 'Õ' => "O",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'Ý' => "Y",
        'Ç' | 'Č' => "C",
        'Ñ' => "N",
        'Š' => "S",
        'Ž' => "Z",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
