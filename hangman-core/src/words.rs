use hangman_types::{Category, Difficulty};
use rand::seq::{IndexedRandom, SliceRandom};
use std::collections::HashSet;

/// A word handed to a round, upper-cased, together with the concrete
/// category it came from (never `Mix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnWord {
    pub word: String,
    pub category: Category,
}

/// Where rounds get their words from.
pub trait WordSource: Send + Sync {
    fn draw_one(&self, category: Category, difficulty: Difficulty) -> DrawnWord;

    /// Returns `count` words, distinct while the eligible pool allows it.
    fn draw_many(&self, category: Category, difficulty: Difficulty, count: usize)
    -> Vec<DrawnWord>;
}

const ANIMALES: &[&str] = &[
    "gato", "perro", "leon", "oso", "pato", "tigre", "zorro", "cebra", "koala", "mono",
    "elefante", "jirafa", "cocodrilo", "delfin", "ballena", "tiburon", "tortuga", "conejo",
    "caballo", "serpiente", "rinoceronte", "hipopotamo", "ornitorrinco", "chimpance",
];

const PAISES: &[&str] = &[
    "peru", "cuba", "chile", "china", "india", "japon", "mexico", "brasil", "espana", "francia",
    "alemania", "italia", "portugal", "colombia", "argentina", "venezuela", "ecuador", "bolivia",
    "canada", "australia",
];

const PELICULAS: &[&str] = &[
    "coco", "cars", "brave", "shrek", "rocky", "alien", "logan", "titanic", "avatar", "frozen",
    "moana", "encanto", "gladiator", "inception", "joker", "matrix", "venom", "batman", "aladdin",
    "hercules", "interestelar", "terminator",
];

const COMIDA: &[&str] = &[
    "pizza", "taco", "sopa", "pan", "arroz", "pasta", "pollo", "carne", "queso", "huevo",
    "hamburguesa", "ensalada", "burrito", "enchilada", "paella", "ceviche", "empanada", "nachos",
    "guacamole", "lasagna", "tiramisu",
];

const DEPORTES: &[&str] = &[
    "futbol", "tenis", "golf", "boxeo", "surf", "rugby", "judo", "yoga", "natacion", "atletismo",
    "ciclismo", "gimnasia", "karate", "taekwondo", "balonmano", "snowboard", "patinaje",
    "baloncesto", "automovilismo",
];

const PROFESIONES: &[&str] = &[
    "chef", "piloto", "actor", "juez", "medico", "abogado", "maestro", "ingeniero", "arquitecto",
    "enfermero", "bombero", "policia", "carpintero", "electricista", "programador", "veterinario",
    "psicologo", "cirujano",
];

const TECNOLOGIA: &[&str] = &[
    "app", "web", "wifi", "mouse", "laptop", "tablet", "drone", "robot", "chip", "software",
    "hardware", "internet", "servidor", "algoritmo", "programa", "navegador", "antivirus",
    "blockchain", "computadora", "programacion",
];

/// The built-in Spanish word lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBank;

impl WordBank {
    pub fn new() -> Self {
        Self
    }

    pub fn words(category: Category) -> &'static [&'static str] {
        match category {
            Category::Animales => ANIMALES,
            Category::Paises => PAISES,
            Category::Peliculas => PELICULAS,
            Category::Comida => COMIDA,
            Category::Deportes => DEPORTES,
            Category::Profesiones => PROFESIONES,
            Category::Tecnologia => TECNOLOGIA,
            Category::Mix => &[],
        }
    }

    /// Words of `category` whose length fits the difficulty, or the whole
    /// list when none do.
    fn pool(category: Category, difficulty: Difficulty) -> Vec<DrawnWord> {
        let range = difficulty.length_range();
        let all = Self::words(category);
        let fitting: Vec<&str> = all
            .iter()
            .copied()
            .filter(|w| range.contains(&w.chars().filter(|c| !c.is_whitespace()).count()))
            .collect();
        let chosen = if fitting.is_empty() { all.to_vec() } else { fitting };

        chosen
            .into_iter()
            .map(|word| DrawnWord {
                word: word.to_uppercase(),
                category,
            })
            .collect()
    }
}

impl WordSource for WordBank {
    fn draw_one(&self, category: Category, difficulty: Difficulty) -> DrawnWord {
        let mut rng = rand::rng();
        let resolved = match category {
            Category::Mix => *Category::CONCRETE
                .choose(&mut rng)
                .unwrap_or(&Category::Animales),
            other => other,
        };

        let pool = Self::pool(resolved, difficulty);
        match pool.choose(&mut rng) {
            Some(drawn) => drawn.clone(),
            None => DrawnWord {
                word: String::from("AHORCADO"),
                category: resolved,
            },
        }
    }

    fn draw_many(
        &self,
        category: Category,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<DrawnWord> {
        let mut pool: Vec<DrawnWord> = match category {
            Category::Mix => Category::CONCRETE
                .iter()
                .flat_map(|c| Self::pool(*c, difficulty))
                .collect(),
            other => Self::pool(other, difficulty),
        };
        if pool.is_empty() {
            return (0..count).map(|_| self.draw_one(category, difficulty)).collect();
        }

        let mut rng = rand::rng();
        pool.shuffle(&mut rng);
        let mut seen = HashSet::new();
        pool.retain(|d| seen.insert(d.word.clone()));

        let mut drawn: Vec<DrawnWord> = pool.iter().take(count).cloned().collect();
        // Pool smaller than the player count: repeats are allowed
        while drawn.len() < count {
            match pool.choose(&mut rng) {
                Some(extra) => drawn.push(extra.clone()),
                None => break,
            }
        }
        drawn
    }
}
