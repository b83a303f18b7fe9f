//! Name normalisation for classes and methods.
//!
//! Harness tables name things the way a reader would write them: `should I buy
//! milk`, `set cash in wallet`, `number_of_login_attempts`. Fixtures register
//! one canonical spelling, and lookups try the aliases produced here.

/// Splits a name into lowercase words on spaces, underscores, hyphens and
/// lowercase-to-uppercase transitions.
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for character in name.chars() {
        if character.is_whitespace() || character == '_' || character == '-' {
            flush(&mut words, &mut current);
            previous_lower = false;
            continue;
        }
        if character.is_uppercase() && previous_lower {
            flush(&mut words, &mut current);
        }
        previous_lower = character.is_lowercase() || character.is_ascii_digit();
        current.extend(character.to_lowercase());
    }
    flush(&mut words, &mut current);
    words
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

fn capitalise(word: &str) -> String {
    let mut characters = word.chars();
    characters.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(characters).collect()
    })
}

/// `set cash in wallet` → `setCashInWallet`.
#[must_use]
pub fn to_lower_camel_case(name: &str) -> String {
    let mut words = words(name).into_iter();
    let Some(first) = words.next() else {
        return String::new();
    };
    words.fold(first, |mut camel, word| {
        camel.push_str(&capitalise(&word));
        camel
    })
}

/// `should I buy milk` → `ShouldIBuyMilk`.
#[must_use]
pub fn to_upper_camel_case(name: &str) -> String {
    words(name).iter().map(|word| capitalise(word)).collect()
}

/// `numberOfLoginAttempts` → `number_of_login_attempts`.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    words(name).join("_")
}

/// Method names to try, in order: as given, lowerCamelCase, snake_case.
#[must_use]
pub fn method_aliases(name: &str) -> Vec<String> {
    let mut aliases = vec![name.to_owned()];
    for alias in [to_lower_camel_case(name), to_snake_case(name)] {
        if !alias.is_empty() && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    }
    aliases
}

/// Class name as registered: names containing spaces are folded to
/// UpperCamelCase, anything else is kept as given.
#[must_use]
pub fn normalise_class_name(name: &str) -> String {
    let trimmed = name.trim();
    if !trimmed.contains(char::is_whitespace) {
        return trimmed.to_owned();
    }
    match trimmed.rsplit_once('.') {
        Some((package, class)) => format!("{package}.{}", to_upper_camel_case(class)),
        None => to_upper_camel_case(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::spaced("should I buy milk", "ShouldIBuyMilk")]
    #[case::already_camel("ShouldIBuyMilk", "ShouldIBuyMilk")]
    #[case::qualified("slim.examples.EchoFixture", "slim.examples.EchoFixture")]
    #[case::padded("  echo fixture ", "EchoFixture")]
    #[case::qualified_spaced("slim.examples.should I buy milk", "slim.examples.ShouldIBuyMilk")]
    fn normalises_class_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalise_class_name(input), expected);
    }

    #[rstest]
    #[case::spaced("set cash in wallet", "setCashInWallet")]
    #[case::snake("number_of_login_attempts", "numberOfLoginAttempts")]
    #[case::camel("loginMessage", "loginMessage")]
    #[case::upper("GoToStore", "goToStore")]
    fn builds_lower_camel_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_lower_camel_case(input), expected);
    }

    #[rstest]
    #[case::camel("numberOfLoginAttempts", "number_of_login_attempts")]
    #[case::spaced("login message", "login_message")]
    #[case::digits("page2Title", "page2_title")]
    fn builds_snake_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(to_snake_case(input), expected);
    }

    #[test]
    fn aliases_start_with_the_exact_name_and_skip_duplicates() {
        assert_eq!(
            method_aliases("set cash in wallet"),
            vec![
                "set cash in wallet".to_owned(),
                "setCashInWallet".to_owned(),
                "set_cash_in_wallet".to_owned(),
            ]
        );
        assert_eq!(method_aliases("echo"), vec!["echo".to_owned()]);
    }
}
