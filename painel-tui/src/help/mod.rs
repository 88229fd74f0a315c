//! Central help module that provides a single entry point (`show_command_help`)
//! to display usage for any recognized console command.

pub mod help_attach;
pub mod help_chat;
pub mod help_login;

fn show_general_help() -> String {
    let text = r#"Painel de Atendimento - Comandos disponíveis:

  help [comando]
    Mostra esta ajuda, ou detalhes de um comando específico.

  login <email> <senha>
    Entra com email e senha.

  token <access_token>
    Entra com um token de acesso já emitido.

  callback <query>
    Conclui o login OAuth com a query recebida (ex.: token=... ou error=...).

  logout
    Sai da conta, encerra a conexão e apaga os dados locais.

  status
    Mostra conexão, atendente, atendimento ativo e anexo pendente.

  queue
    Pede a fila ao servidor e lista os atendimentos abertos.

  join <n|sessao_id>
    Entra no atendimento de número n da fila (ou pelo id da sessão).

  say <texto>
    Envia uma mensagem no atendimento ativo.

  chat
    Modo conversa: cada linha digitada é enviada. /quit para sair.

  draft <texto>
    Define o rascunho sem enviar; é usado como legenda do próximo arquivo.

  attach <caminho>
    Seleciona um arquivo para envio.

  sendfile
    Envia o arquivo selecionado ao solicitante.

  cancel
    Descarta o arquivo selecionado.

  end
    Encerra o atendimento ativo (pede confirmação).

  quit
    Fecha o painel.
"#;
    text.to_owned()
}

pub fn show_command_help(command: &str) -> String {
    match command {
        "" => show_general_help(),
        "login" | "token" | "callback" | "logout" => help_login::LOGIN_HELP_TEXT.to_owned(),
        "chat" | "say" => help_chat::CHAT_HELP_TEXT.to_owned(),
        "attach" | "sendfile" | "cancel" | "draft" | "caption" => help_attach::ATTACH_HELP_TEXT.to_owned(),
        other => format!("Sem ajuda para '{}'. Digite 'help' para a lista de comandos.", other),
    }
}
