use phf::phf_map;

const STDIO: &[&str] = &[
    "printf", "scanf", "puts", "putchar", "getchar", "fprintf", "sprintf", "fopen", "fclose",
];
const STDLIB: &[&str] = &[
    "malloc", "calloc", "realloc", "free", "exit", "abs", "atoi", "rand", "srand",
];
const STRING: &[&str] = &["strlen", "strcpy", "strncpy", "strcmp", "strcat", "memset", "memcpy"];
const MATH: &[&str] = &["sqrt", "pow", "fabs", "floor", "ceil", "sin", "cos", "tan"];
const CTYPE: &[&str] = &["isdigit", "isalpha", "isspace", "toupper", "tolower"];

/// Functions made visible by including a standard header.
static HEADER_FUNCTIONS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "stdio.h" => STDIO,
    "stdlib.h" => STDLIB,
    "string.h" => STRING,
    "math.h" => MATH,
    "ctype.h" => CTYPE,
};

pub fn functions_for(header: &str) -> &'static [&'static str] {
    HEADER_FUNCTIONS.get(header).copied().unwrap_or(&[])
}
