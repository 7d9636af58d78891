use anyhow::Result;

use euroservice::conversation::*;
use euroservice::dialogue::{
    ConversationState, Cursor, FormState, FuneralField, MemoryDraft, MemoryField, ProductCategory,
    ProductDraft, ProductField, RegistrationDraft, RegistrationField, RemovalStep,
};
use euroservice::localization::t_lang;
use euroservice::package_matcher::{BudgetTier, FuneralType, ServiceTag};
use euroservice::validation::ValidationError;

fn text(value: &str) -> Input {
    Input::Text(value.to_string())
}

/// Feeds inputs one by one and returns the last step
fn run(mut state: ConversationState, inputs: Vec<Input>) -> Step {
    let mut last = None;
    for input in inputs {
        let step = advance(state, input);
        state = step.next.clone();
        last = Some(step);
    }
    last.expect("at least one input")
}

fn registration_answers() -> Vec<Input> {
    vec![
        text("Иванов Иван Иванович"),
        text("+7 (999) 123-45-67"),
        Input::Skip,
        text("15.3.1980"),
        text("4510"),
        text("123456"),
        text("ОВД района Арбат"),
        text("12.04.2005"),
        text("Москва, ул. Ленина, д. 1"),
        text("Петров Петр, +79997654321"),
        text("сын"),
    ]
}

/// Integration test for a complete registration ending on the summary
#[tokio::test]
async fn test_registration_flow_reaches_summary_and_saves() -> Result<()> {
    let step = run(registration_start(), registration_answers());
    assert_eq!(step.reply, Reply::Prompt);

    let summary = match &step.next {
        ConversationState::Registration(form) => {
            assert_eq!(form.cursor, Cursor::Summary);
            assert_eq!(form.draft.email, None);
            assert_eq!(form.draft.birth_date.as_deref(), Some("15.03.1980"));
            step.next.clone()
        }
        other => panic!("unexpected state {other:?}"),
    };

    let saved = advance(summary, Input::Confirm);
    assert_eq!(saved.next, ConversationState::Idle);
    match saved.effect {
        Some(Effect::SaveClient(draft)) => {
            assert_eq!(draft.full_name.as_deref(), Some("Иванов Иван Иванович"));
            assert_eq!(draft.relationship.as_deref(), Some("сын"));
        }
        other => panic!("unexpected effect {other:?}"),
    }
    Ok(())
}

/// Editing one field from the summary goes straight back to the summary
#[tokio::test]
async fn test_single_field_edit_returns_to_summary() -> Result<()> {
    let summary = run(registration_start(), registration_answers()).next;

    let choose = advance(summary.clone(), Input::Change);
    assert_eq!(choose.reply, Reply::ChooseField);
    assert_eq!(choose.next, summary);

    let editing = advance(summary, Input::EditField("phone".to_string()));
    match &editing.next {
        ConversationState::Registration(form) => assert_eq!(
            form.cursor,
            Cursor::Field {
                field: RegistrationField::Phone,
                editing: true
            }
        ),
        other => panic!("unexpected state {other:?}"),
    }

    let rejected = advance(editing.next.clone(), text("12345"));
    assert_eq!(rejected.reply, Reply::Rejected(ValidationError::InvalidPhone));
    assert_eq!(rejected.next, editing.next);

    let edited = advance(editing.next, text("89161234567"));
    match edited.next {
        ConversationState::Registration(form) => {
            assert_eq!(form.cursor, Cursor::Summary);
            assert_eq!(form.draft.phone.as_deref(), Some("89161234567"));
            assert_eq!(form.draft.address.as_deref(), Some("Москва, ул. Ленина, д. 1"));
        }
        other => panic!("unexpected state {other:?}"),
    }
    Ok(())
}

/// Stored profiles open on the summary so any single field can be changed
#[tokio::test]
async fn test_registration_edit_starts_on_summary() -> Result<()> {
    let draft = RegistrationDraft {
        full_name: Some("Сидорова Анна".to_string()),
        ..RegistrationDraft::default()
    };
    let state = registration_edit(draft.clone());
    assert_eq!(
        state,
        ConversationState::Registration(FormState {
            draft,
            cursor: Cursor::Summary
        })
    );

    let unknown = advance(state.clone(), Input::EditField("shoe_size".to_string()));
    assert_eq!(unknown.reply, Reply::Rejected(ValidationError::UnexpectedInput));
    assert_eq!(unknown.next, state);
    Ok(())
}

/// Cancel leaves every state for idle
#[tokio::test]
async fn test_cancel_from_every_state() -> Result<()> {
    let states = vec![
        ConversationState::Idle,
        registration_start(),
        funeral_start(),
        memory_start(),
        add_product_start(),
        ConversationState::RemoveProduct(RemovalStep::ChooseCategory),
        ConversationState::RemoveProduct(RemovalStep::EnterId {
            category: ProductCategory::Cross,
        }),
        ai_question_start(500),
        pending_voice(funeral_start(), "кремация".to_string()),
        ConversationState::VoiceEdit {
            resume: Box::new(memory_start()),
        },
    ];

    for state in states {
        let step = advance(state, Input::Cancel);
        assert_eq!(step.next, ConversationState::Idle);
        assert_eq!(step.reply, Reply::Cancelled);
        assert_eq!(step.effect, None);
    }
    Ok(())
}

#[tokio::test]
async fn test_funeral_flow_with_buttons() -> Result<()> {
    let step = run(
        funeral_start(),
        vec![
            text("Москва, морг №1"),
            Input::choice("funeral_type", "cremation"),
            Input::choice("services", "transport"),
            Input::choice("services", "documents"),
            Input::choice("services", "transport"),
            Input::choice("services", "hall"),
            Input::Done,
            Input::choice("budget", "30k_60k"),
            Input::Confirm,
        ],
    );

    assert_eq!(step.next, ConversationState::Idle);
    match step.effect {
        Some(Effect::SaveFuneralForm(draft)) => {
            assert_eq!(draft.funeral_type, Some(FuneralType::Cremation));
            assert_eq!(draft.services, vec![ServiceTag::Documents, ServiceTag::Hall]);
            assert_eq!(draft.budget, Some(BudgetTier::From30kTo60k));
        }
        other => panic!("unexpected effect {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_funeral_services_typed_as_list() -> Result<()> {
    let step = run(
        funeral_start(),
        vec![
            text("Москва, морг №1"),
            text("традиционные похороны"),
            text("гроб, венки, гроб"),
        ],
    );

    match step.next {
        ConversationState::Funeral(form) => {
            assert_eq!(form.draft.services, vec![ServiceTag::Coffin, ServiceTag::Wreaths]);
            assert_eq!(
                form.cursor,
                Cursor::Field {
                    field: FuneralField::Budget,
                    editing: false
                }
            );
        }
        other => panic!("unexpected state {other:?}"),
    }

    let unknown = run(
        funeral_start(),
        vec![text("Москва, морг №1"), text("кремация"), text("фейерверк")],
    );
    assert_eq!(unknown.reply, Reply::Rejected(ValidationError::UnknownService));
    Ok(())
}

#[tokio::test]
async fn test_memory_flow_rejects_death_before_birth() -> Result<()> {
    let state = run(
        memory_start(),
        vec![Input::Skip, text("Иванова Мария Петровна"), text("01.01.1950")],
    )
    .next;

    let rejected = advance(state.clone(), text("31.12.1949"));
    assert_eq!(rejected.reply, Reply::Rejected(ValidationError::DeathBeforeBirth));
    assert_eq!(rejected.next, state);

    let step = run(state, vec![text("02.02.2020"), text("Любим, помним, скорбим")]);
    let summary = match step.next {
        ConversationState::Memory(form) => {
            assert_eq!(form.cursor, Cursor::Summary);
            form
        }
        other => panic!("unexpected state {other:?}"),
    };

    // A later birth date edit must still precede the death date
    let mut editing = summary.clone();
    editing.cursor = Cursor::Field {
        field: MemoryField::BirthDate,
        editing: true,
    };
    let rejected = advance(ConversationState::Memory(editing), text("01.01.2021"));
    assert_eq!(rejected.reply, Reply::Rejected(ValidationError::DeathBeforeBirth));

    let created = advance(ConversationState::Memory(summary), Input::Confirm);
    assert_eq!(
        created.effect,
        Some(Effect::CreateMemory(MemoryDraft {
            photo_file_id: None,
            name: Some("Иванова Мария Петровна".to_string()),
            birth_date: Some("01.01.1950".to_string()),
            death_date: Some("02.02.2020".to_string()),
            memory_text: Some("Любим, помним, скорбим".to_string()),
        }))
    );
    Ok(())
}

#[tokio::test]
async fn test_memory_photo_step_wants_a_photo() -> Result<()> {
    let rejected = advance(memory_start(), text("вот фото"));
    assert_eq!(rejected.reply, Reply::Rejected(ValidationError::PhotoRequired));

    let accepted = advance(
        memory_start(),
        Input::Photo {
            file_id: "AgACAgIAAxkBAAI".to_string(),
        },
    );
    match accepted.next {
        ConversationState::Memory(form) => {
            assert_eq!(form.draft.photo_file_id.as_deref(), Some("AgACAgIAAxkBAAI"));
        }
        other => panic!("unexpected state {other:?}"),
    }
    Ok(())
}

/// Every product value needs a confirm, the last one adds the product
#[tokio::test]
async fn test_add_product_confirms_each_field() -> Result<()> {
    let step = advance(add_product_start(), Input::choice("category", "wreath"));
    match &step.next {
        ConversationState::AddProduct(form) => assert_eq!(
            form.cursor,
            Cursor::ConfirmField {
                field: ProductField::Category,
                editing: false
            }
        ),
        other => panic!("unexpected state {other:?}"),
    }

    let changed = advance(step.next, Input::Change);
    match &changed.next {
        ConversationState::AddProduct(form) => assert_eq!(
            form.cursor,
            Cursor::Field {
                field: ProductField::Category,
                editing: false
            }
        ),
        other => panic!("unexpected state {other:?}"),
    }

    let step = run(
        changed.next,
        vec![
            Input::choice("category", "cross"),
            Input::Confirm,
            text("Крест кованый"),
            Input::Confirm,
            Input::Skip,
            Input::Confirm,
            text("18 500,50 ₽"),
            Input::Confirm,
        ],
    );

    assert_eq!(step.next, ConversationState::Idle);
    assert_eq!(
        step.effect,
        Some(Effect::AddProduct(ProductDraft {
            category: Some(ProductCategory::Cross),
            name: Some("Крест кованый".to_string()),
            description: None,
            price: Some(18500.5),
        }))
    );
    Ok(())
}

#[tokio::test]
async fn test_remove_product_is_lookup_driven() -> Result<()> {
    let choose = ConversationState::RemoveProduct(RemovalStep::ChooseCategory);

    let listed = advance(choose.clone(), Input::choice("category", "wreath"));
    assert_eq!(listed.next, choose);
    assert_eq!(
        listed.effect,
        Some(Effect::ListRemovalCandidates {
            category: ProductCategory::Wreath
        })
    );

    let unknown = advance(choose, text("лопаты"));
    assert_eq!(unknown.reply, Reply::Rejected(ValidationError::UnknownCategory));

    let enter_id = ConversationState::RemoveProduct(RemovalStep::EnterId {
        category: ProductCategory::Wreath,
    });
    let bad_id = advance(enter_id.clone(), text("пятый"));
    assert_eq!(bad_id.reply, Reply::Rejected(ValidationError::InvalidProductId));
    assert_eq!(bad_id.next, enter_id);

    let remove = advance(enter_id.clone(), text("#12"));
    assert_eq!(remove.next, enter_id);
    assert_eq!(
        remove.effect,
        Some(Effect::RemoveProduct {
            category: ProductCategory::Wreath,
            id: 12
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_assistant_question_limits() -> Result<()> {
    let asked = advance(ai_question_start(500), text("  Как получить свидетельство о смерти?  "));
    assert_eq!(asked.next, ai_question_start(500));
    assert_eq!(
        asked.effect,
        Some(Effect::AskAssistant {
            question: "Как получить свидетельство о смерти?".to_string()
        })
    );

    let too_long = advance(ai_question_start(500), text(&"а".repeat(501)));
    assert_eq!(too_long.reply, Reply::Rejected(ValidationError::TooLong { max: 500 }));
    assert_eq!(too_long.effect, None);

    // the configured limit travels with the state
    let short_limit = advance(ai_question_start(20), text("Какие документы нужны для захоронения?"));
    assert_eq!(short_limit.next, ai_question_start(20));
    assert_eq!(short_limit.reply, Reply::Rejected(ValidationError::TooLong { max: 20 }));
    assert_eq!(short_limit.effect, None);
    Ok(())
}

/// Confirmed transcripts are replayed into the interrupted step
#[tokio::test]
async fn test_voice_confirm_replays_into_flow() -> Result<()> {
    let pending = pending_voice(memory_start(), "пропустить".to_string());
    let step = advance(pending, Input::Confirm);
    match step.next {
        ConversationState::Memory(form) => assert_eq!(
            form.cursor,
            Cursor::Field {
                field: MemoryField::Name,
                editing: false
            }
        ),
        other => panic!("unexpected state {other:?}"),
    }

    let idle = advance(pending_voice(ConversationState::Idle, "добрый день".to_string()), Input::Confirm);
    assert_eq!(idle.next, ConversationState::Idle);
    assert_eq!(idle.reply, Reply::Echo("добрый день".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_voice_edit_sends_typed_text_to_flow() -> Result<()> {
    let pending = pending_voice(ai_question_start(500), "как оформить субсидию".to_string());

    let edit = advance(pending, Input::Change);
    assert_eq!(
        edit.next,
        ConversationState::VoiceEdit {
            resume: Box::new(ai_question_start(500))
        }
    );
    assert_eq!(edit.reply, Reply::Prompt);

    let asked = advance(edit.next, text("Как оформить пособие на погребение?"));
    assert_eq!(
        asked.effect,
        Some(Effect::AskAssistant {
            question: "Как оформить пособие на погребение?".to_string()
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_router_precedence() -> Result<()> {
    let in_form = registration_start();

    assert_eq!(
        route_message(&in_form, &Event::Text("/start".to_string()), false),
        Route::Menu(MenuCommand::Start)
    );
    assert_eq!(
        route_message(&in_form, &Event::Text(t_lang("menu-shop", None)), false),
        Route::Menu(MenuCommand::Shop)
    );
    assert_eq!(
        route_message(&in_form, &Event::Text("Отмена".to_string()), false),
        Route::Advance(Input::Cancel)
    );
    assert_eq!(
        route_message(&in_form, &Event::Text(t_lang("button-cancel", Some("en"))), false),
        Route::Advance(Input::Cancel)
    );
    assert_eq!(route_message(&in_form, &Event::Voice, false), Route::Voice);
    assert_eq!(route_message(&ConversationState::Idle, &Event::Voice, false), Route::Voice);
    assert_eq!(
        route_message(&in_form, &Event::Text(t_lang("button-skip", None)), false),
        Route::Advance(Input::Skip)
    );
    assert_eq!(
        route_message(&in_form, &Event::Text("Иванов Иван".to_string()), false),
        Route::Advance(text("Иванов Иван"))
    );
    assert_eq!(
        route_message(&ConversationState::Idle, &Event::Text("привет".to_string()), false),
        Route::Unrecognized
    );
    assert_eq!(route_message(&in_form, &Event::Other, false), Route::Unrecognized);

    let photo = Event::Photo {
        file_id: "photo-1".to_string(),
    };
    assert_eq!(
        route_message(&memory_start(), &photo, false),
        Route::Advance(Input::Photo {
            file_id: "photo-1".to_string()
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_admin_labels_only_for_admins() -> Result<()> {
    let label = t_lang("admin-stats", None);

    assert_eq!(MenuCommand::parse(&label, true), Some(MenuCommand::AdminStats));
    assert_eq!(MenuCommand::parse(&label, false), None);
    assert_eq!(
        MenuCommand::parse(&t_lang("admin-add-product", Some("en")), true),
        Some(MenuCommand::AdminAddProduct)
    );
    Ok(())
}

/// States survive a serde round trip, as any dialogue storage requires
#[tokio::test]
async fn test_state_serialization() -> Result<()> {
    let state = pending_voice(
        run(funeral_start(), vec![text("Москва, морг №1"), Input::choice("funeral_type", "cremation")]).next,
        "гроб".to_string(),
    );

    let json = serde_json::to_string(&state)?;
    let restored: ConversationState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);
    Ok(())
}

/// A rejected value leaves the registration where it was, whatever the step
#[tokio::test]
async fn test_invalid_value_at_every_registration_step_keeps_state() -> Result<()> {
    let invalid = [
        (RegistrationField::FullName, text("Иван")),
        (RegistrationField::Phone, text("12345")),
        (RegistrationField::Email, text("ivanov@")),
        (RegistrationField::BirthDate, text("31.02.1980")),
        (RegistrationField::PassportSeries, text("45А0")),
        (RegistrationField::PassportNumber, text("12345")),
        (RegistrationField::PassportIssuedBy, text("ОВД")),
        (RegistrationField::PassportIssueDate, text("2005-04-12")),
        (RegistrationField::Address, text("Москва")),
        (RegistrationField::EmergencyContact, text("Петров")),
        (RegistrationField::Relationship, Input::Skip),
    ];
    assert_eq!(invalid.len(), RegistrationField::ALL.len());

    let answers = registration_answers();
    for (index, (field, bad_input)) in invalid.into_iter().enumerate() {
        let state = if index == 0 {
            registration_start()
        } else {
            run(registration_start(), answers[..index].to_vec()).next
        };
        match &state {
            ConversationState::Registration(form) => assert_eq!(
                form.cursor,
                Cursor::Field {
                    field,
                    editing: false
                }
            ),
            other => panic!("unexpected state {other:?}"),
        }

        let step = advance(state.clone(), bad_input);
        assert_eq!(step.next, state, "{field:?} moved on after an invalid value");
        assert_eq!(step.effect, None);
        assert!(matches!(step.reply, Reply::Rejected(_)), "{field:?} answered {:?}", step.reply);
    }
    Ok(())
}

/// A confirmed transcript at the phone step behaves like the same text typed
#[tokio::test]
async fn test_voice_replay_at_phone_step_matches_typing() -> Result<()> {
    let phone_step = run(registration_start(), vec![text("Иванов Иван Иванович")]).next;

    for spoken in ["+7 999 123 45 67", "12345"] {
        let typed = advance(phone_step.clone(), normalize_text(spoken));
        let voiced = advance(pending_voice(phone_step.clone(), spoken.to_string()), Input::Confirm);
        assert_eq!(voiced, typed, "voice and typing differ for {spoken}");
    }

    let valid = advance(phone_step.clone(), normalize_text("+7 999 123 45 67"));
    assert_eq!(valid.reply, Reply::Prompt);
    let invalid = advance(phone_step.clone(), normalize_text("12345"));
    assert_eq!(invalid.reply, Reply::Rejected(ValidationError::InvalidPhone));
    assert_eq!(invalid.next, phone_step);
    Ok(())
}

/// Buttons left on screen from another step never fill the current field
#[tokio::test]
async fn test_button_of_another_step_is_rejected() -> Result<()> {
    let funeral = funeral_start();
    let step = advance(funeral.clone(), Input::choice("services", "transport"));
    assert_eq!(step.next, funeral);
    assert_eq!(step.reply, Reply::Rejected(ValidationError::UnexpectedInput));

    let name_step = run(
        add_product_start(),
        vec![Input::choice("category", "wreath"), Input::ConfirmField("category".to_string())],
    )
    .next;
    match &name_step {
        ConversationState::AddProduct(form) => assert_eq!(
            form.cursor,
            Cursor::Field {
                field: ProductField::Name,
                editing: false
            }
        ),
        other => panic!("unexpected state {other:?}"),
    }
    let step = advance(name_step.clone(), Input::choice("category", "wreath"));
    assert_eq!(step.next, name_step);
    assert_eq!(step.reply, Reply::Rejected(ValidationError::UnexpectedInput));

    let enter_id = ConversationState::RemoveProduct(RemovalStep::EnterId {
        category: ProductCategory::Wreath,
    });
    let step = advance(enter_id.clone(), Input::choice("category", "cross"));
    assert_eq!(step.next, enter_id);
    assert_eq!(step.effect, None);
    Ok(())
}

/// A confirm button only confirms the field it was shown for
#[tokio::test]
async fn test_field_confirmation_checks_its_field() -> Result<()> {
    let confirming = advance(add_product_start(), Input::choice("category", "cross")).next;

    let stale = advance(confirming.clone(), Input::ConfirmField("name".to_string()));
    assert_eq!(stale.next, confirming);
    assert_eq!(stale.reply, Reply::Rejected(ValidationError::UnexpectedInput));

    let stale_change = advance(confirming.clone(), Input::ChangeField("price".to_string()));
    assert_eq!(stale_change.next, confirming);

    let confirmed = advance(confirming, Input::ConfirmField("category".to_string()));
    match confirmed.next {
        ConversationState::AddProduct(form) => {
            assert_eq!(form.draft.category, Some(ProductCategory::Cross));
            assert_eq!(
                form.cursor,
                Cursor::Field {
                    field: ProductField::Name,
                    editing: false
                }
            );
        }
        other => panic!("unexpected state {other:?}"),
    }
    Ok(())
}
