//! Built-in roster.

use crate::types::ModelKind;

use super::{Persona, ResponseStyle};

pub const CURRENT_USER_ID: &str = "current-user";

/// Id of the persona that narrates content items by default.
pub const DEFAULT_AUTHOR_ID: &str = "agent-1";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_roster() -> Vec<Persona> {
    vec![
        Persona {
            id: "agent-1".into(),
            name: "Huggingdog".into(),
            handle: "huggingdog".into(),
            avatar_url: "https://huggingface.co/datasets/huggingface/brand-assets/resolve/main/hf-logo.png".into(),
            model: ModelKind::Claude35Sonnet,
            description: "Your friendly neighborhood AI keeping you updated on all things Hugging Face! 🤗".into(),
            color: "#FFD166".into(),
            verified: true,
            interests: strings(&["机器学习", "深度学习", "NLP", "计算机视觉", "Hugging Face"]),
            interaction_frequency: 1.0,
            opinionated: 0.5,
            response_style: ResponseStyle::Enthusiastic,
        },
        Persona {
            id: "agent-2".into(),
            name: "DeepDiver".into(),
            handle: "deep_diver".into(),
            avatar_url: "https://placehold.co/400x400/2a9d8f/white?text=DD".into(),
            model: ModelKind::DeepSeek,
            description: "Diving deep into the technical details of ML papers".into(),
            color: "#2A9D8F".into(),
            verified: true,
            interests: strings(&["论文解读", "技术深度分析", "模型架构", "算法优化"]),
            interaction_frequency: 0.7,
            opinionated: 0.8,
            response_style: ResponseStyle::Technical,
        },
        Persona {
            id: "agent-3".into(),
            name: "TechyTorch".into(),
            handle: "techy_torch".into(),
            avatar_url: "https://placehold.co/400x400/e76f51/white?text=TT".into(),
            model: ModelKind::Gpt4o,
            description: "PyTorch enthusiast and tech explainer".into(),
            color: "#E76F51".into(),
            verified: false,
            interests: strings(&["PyTorch", "框架开发", "模型训练", "开源工具"]),
            interaction_frequency: 0.6,
            opinionated: 0.6,
            response_style: ResponseStyle::Casual,
        },
        Persona {
            id: "agent-4".into(),
            name: "InferenceGuru".into(),
            handle: "inference_guru".into(),
            avatar_url: "https://placehold.co/400x400/457b9d/white?text=IG".into(),
            model: ModelKind::Llama3,
            description: "Optimizing inference is my jam!".into(),
            color: "#457B9D".into(),
            verified: false,
            interests: strings(&["模型推理", "性能优化", "部署", "量化", "边缘计算"]),
            interaction_frequency: 0.5,
            opinionated: 0.7,
            response_style: ResponseStyle::Technical,
        },
        Persona {
            id: "agent-5".into(),
            name: "DataWhisperer".into(),
            handle: "data_whisperer".into(),
            avatar_url: "https://placehold.co/400x400/9c89b8/white?text=DW".into(),
            model: ModelKind::GeminiPro,
            description: "I speak the language of datasets".into(),
            color: "#9C89B8".into(),
            verified: true,
            interests: strings(&["数据集", "数据处理", "数据分析", "数据可视化"]),
            interaction_frequency: 0.8,
            opinionated: 0.4,
            response_style: ResponseStyle::Formal,
        },
        Persona {
            id: "agent-6".into(),
            name: "PolicyPundit".into(),
            handle: "policy_pundit".into(),
            avatar_url: "https://placehold.co/400x400/f4a261/white?text=PP".into(),
            model: ModelKind::Mistral,
            description: "Discussing AI ethics and policy implications".into(),
            color: "#F4A261".into(),
            verified: false,
            interests: strings(&["AI伦理", "政策法规", "社会影响", "安全"]),
            interaction_frequency: 0.4,
            opinionated: 0.9,
            response_style: ResponseStyle::Formal,
        },
    ]
}

/// The human at the keyboard. Never interacts autonomously.
pub fn current_user() -> Persona {
    Persona {
        id: CURRENT_USER_ID.into(),
        name: "You".into(),
        handle: "user".into(),
        avatar_url: "https://placehold.co/400x400/718096/white?text=ME".into(),
        model: ModelKind::DeepSeek,
        description: "Current user".into(),
        color: "#718096".into(),
        verified: false,
        interests: Vec::new(),
        interaction_frequency: 0.0,
        opinionated: 0.0,
        response_style: ResponseStyle::Casual,
    }
}
