//! Built-in topic list used when analysis is unavailable.

use crate::types::{Locale, TrendAnalysis, TrendTopic};

struct Seed {
    name: &'static str,
    count: u64,
    popularity: f64,
    description: &'static str,
    tags: &'static [&'static str],
}

const ZH_TOPICS: [Seed; 6] = [
    Seed {
        name: "大语言模型",
        count: 157,
        popularity: 98.0,
        description: "大语言模型继续主导AI领域，特别是随着更多开源模型的发布",
        tags: &["LLM", "NLP", "Transformer"],
    },
    Seed {
        name: "多模态",
        count: 103,
        popularity: 92.0,
        description: "结合文本、图像、音频的AI模型越来越受关注",
        tags: &["Multimodal", "Vision-Language"],
    },
    Seed {
        name: "生成式AI",
        count: 89,
        popularity: 87.0,
        description: "能够创造新内容的AI技术持续热门",
        tags: &["Generative AI", "Creative AI"],
    },
    Seed {
        name: "AI安全",
        count: 76,
        popularity: 83.0,
        description: "随着AI能力增强，安全问题受到更多关注",
        tags: &["Safety", "Alignment"],
    },
    Seed {
        name: "高效微调",
        count: 65,
        popularity: 80.0,
        description: "优化大模型训练和部署的技术",
        tags: &["LoRA", "PEFT", "Efficient Fine-tuning"],
    },
    Seed {
        name: "AI应用",
        count: 58,
        popularity: 75.0,
        description: "AI技术在实际场景中的应用案例",
        tags: &["应用", "实践"],
    },
];

const EN_TOPICS: [Seed; 6] = [
    Seed {
        name: "Large Language Models",
        count: 157,
        popularity: 98.0,
        description: "LLMs continue to dominate the AI field, especially with more open-source models being released",
        tags: &["LLM", "NLP", "Transformer"],
    },
    Seed {
        name: "Multimodal AI",
        count: 103,
        popularity: 92.0,
        description: "AI models combining text, image, and audio are gaining more attention",
        tags: &["Multimodal", "Vision-Language"],
    },
    Seed {
        name: "Generative AI",
        count: 89,
        popularity: 87.0,
        description: "AI technologies capable of creating new content remain popular",
        tags: &["Generative AI", "Creative AI"],
    },
    Seed {
        name: "AI Safety",
        count: 76,
        popularity: 83.0,
        description: "Safety concerns receive more attention as AI capabilities increase",
        tags: &["Safety", "Alignment"],
    },
    Seed {
        name: "Efficient Fine-tuning",
        count: 65,
        popularity: 80.0,
        description: "Techniques for optimizing large model training and deployment",
        tags: &["LoRA", "PEFT", "Efficient Fine-tuning"],
    },
    Seed {
        name: "AI Applications",
        count: 58,
        popularity: 75.0,
        description: "Real-world applications of AI technologies",
        tags: &["Applications", "Implementation"],
    },
];

const ZH_SUMMARY: &str =
    "当前AI领域主要由大语言模型和多模态技术主导，同时AI安全和高效部署也成为重要研究方向。";
const EN_SUMMARY: &str = "The AI field is currently dominated by large language models and multimodal technologies, while AI safety and efficient deployment are also becoming important research directions.";

/// Fresh six-topic analysis for `locale`, stamped now with new topic ids.
pub fn fallback_analysis(locale: Locale) -> TrendAnalysis {
    let (seeds, summary) = match locale {
        Locale::Zh => (&ZH_TOPICS, ZH_SUMMARY),
        Locale::En => (&EN_TOPICS, EN_SUMMARY),
    };
    let topics = seeds
        .iter()
        .map(|seed| {
            TrendTopic::new(seed.name)
                .with_count(seed.count)
                .with_popularity(seed.popularity)
                .with_description(seed.description)
                .with_related_tags(seed.tags.iter().copied())
        })
        .collect();
    TrendAnalysis::new(topics).with_summary(summary)
}
