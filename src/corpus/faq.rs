//! Curated question/answer pairs indexed alongside the corpus
//!
//! Each entry becomes one `DocumentUnit` with source `FAQ`, page 0 and the
//! two-line content `Q: <question>\nA: <answer>`. The FAQ matcher reads the
//! answer back from the `A:` line.

use super::{DocumentUnit, FAQ_SOURCE};

/// A fixed question/answer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

impl FaqEntry {
    /// Two-line block stored in the index
    pub fn content(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }

    pub fn to_document(&self) -> DocumentUnit {
        DocumentUnit::new(self.content(), FAQ_SOURCE, 0)
    }
}

pub const FAQ_ENTRIES: &[FaqEntry] = &[
    FaqEntry {
        question: "What are the all the different names or titles used for Krishna in the Gita?",
        answer: "Krishna, Vasudeva, Keshava, Govinda, Madhava, Hrishikesha, Janardana, Achyuta, \
                 Madhusudana, Jagannivasa, Parthasarathi, Yogeshwara, Bhagavan, Ishwara, Adideva, \
                 Purushottama, Devesha, Lokeshwara, Sarvaloka Maheshwara, Mahabaho, Saurin, Yadava, \
                 Pandava Sakha, Atman, Brahman, Paramatma, Kalosmi, Vishvarupa, Jagatpati, Jagatguru.",
    },
    FaqEntry {
        question: "What are the different names or titles used for Arjuna in the Gita?",
        answer: "Arjuna, Partha, Dhananjaya, Gudakesha, Bharata, Kesava, Savyasachi, Kaunteya.",
    },
    FaqEntry {
        question: "List all types of yoga discussed in the Gita.",
        answer: "Karma Yoga, Jnana Yoga, Bhakti Yoga, Raja Yoga, Dhyana Yoga, Sankhya Yoga, \
                 Jnana-Vijnana Yoga, Ksetra-Ksetrajna Vibhaga Yoga.",
    },
    FaqEntry {
        question: "What are all the different paths to liberation mentioned in the Gita?",
        answer: "Karma Yoga (selfless action), Jnana Yoga (knowledge), Bhakti Yoga (devotion), \
                 Dhyana Yoga (meditation).",
    },
    FaqEntry {
        question: "Which all characters are mentioned in the Bhagavad Gita?",
        answer: "Krishna, Arjuna, Dhritarashtra, Sanjaya, Bhishma, Drona, Karna, Yudhishthira, \
                 Duryodhana, and others.",
    },
    FaqEntry {
        question: "List all the kings or warriors referenced in the Gita.",
        answer: "Dhritarashtra, Arjuna, Bhishma, Drona, Karna, Yudhishthira, Duryodhana, Shalya, \
                 and others.",
    },
    FaqEntry {
        question: "What is the structure of the Gita across its 18 chapters?",
        answer: "Chapters 1–6: Karma Yoga and Dhyana Yoga, Chapters 7–12: Bhakti Yoga, \
                 Chapters 13–18: Jnana Yoga and synthesis of all paths.",
    },
];

/// The static FAQ set
pub fn faq_entries() -> &'static [FaqEntry] {
    FAQ_ENTRIES
}

/// Materialize the FAQ set as document units, in definition order
pub fn load_faq_documents() -> Vec<DocumentUnit> {
    FAQ_ENTRIES.iter().map(FaqEntry::to_document).collect()
}
